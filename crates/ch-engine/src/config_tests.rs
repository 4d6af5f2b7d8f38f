use super::*;

fn clear_tasker_vars() {
    for name in [
        "CH_REDIS_ADDR",
        "CH_REDIS_PASSWORD",
        "CH_RESOURCE_SET",
        "CH_TASK_SET",
        "CH_TASK_QUEUE",
        "CH_TASK_DLQ",
        "CH_TASK_BATCH_SIZE",
    ] {
        std::env::remove_var(name);
    }
}

#[test]
fn tasker_config_loads_required_vars() {
    clear_tasker_vars();
    std::env::set_var("CH_REDIS_ADDR", "localhost:6379");
    std::env::set_var("CH_RESOURCE_SET", "resources");
    std::env::set_var("CH_TASK_SET", "tasks");
    std::env::set_var("CH_TASK_QUEUE", "chyme-tasks");
    std::env::set_var("CH_TASK_DLQ", "chyme-tasks-dlq");
    std::env::set_var("CH_TASK_BATCH_SIZE", "25");

    let config = TaskerConfig::from_env().unwrap();
    assert_eq!(config.redis.address, "localhost:6379");
    assert_eq!(config.task_batch_size, 25);
    assert_eq!(config.task_queue_name, "chyme-tasks");
    clear_tasker_vars();
}

#[test]
fn tasker_config_errors_on_missing_var() {
    clear_tasker_vars();
    std::env::set_var("CH_REDIS_ADDR", "localhost:6379");
    // CH_RESOURCE_SET deliberately left unset.
    let err = TaskerConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Missing("CH_RESOURCE_SET")));
    clear_tasker_vars();
}

#[test]
fn tasker_config_errors_on_non_numeric_batch_size() {
    clear_tasker_vars();
    std::env::set_var("CH_REDIS_ADDR", "localhost:6379");
    std::env::set_var("CH_RESOURCE_SET", "resources");
    std::env::set_var("CH_TASK_SET", "tasks");
    std::env::set_var("CH_TASK_QUEUE", "chyme-tasks");
    std::env::set_var("CH_TASK_DLQ", "chyme-tasks-dlq");
    std::env::set_var("CH_TASK_BATCH_SIZE", "not-a-number");

    let err = TaskerConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { name: "CH_TASK_BATCH_SIZE", .. }));
    clear_tasker_vars();
}

#[test]
fn docker_config_defaults_pull_false_remove_true() {
    std::env::remove_var("CH_WORKER_DOCKER_PULL");
    std::env::remove_var("CH_WORKER_DOCKER_REMOVE");
    let config = DockerConfig::from_env();
    assert!(!config.pull);
    assert!(config.remove);
}

#[test]
fn docker_config_reads_explicit_overrides() {
    std::env::set_var("CH_WORKER_DOCKER_PULL", "true");
    std::env::set_var("CH_WORKER_DOCKER_REMOVE", "false");
    let config = DockerConfig::from_env();
    assert!(config.pull);
    assert!(!config.remove);
    std::env::remove_var("CH_WORKER_DOCKER_PULL");
    std::env::remove_var("CH_WORKER_DOCKER_REMOVE");
}

#[test]
fn worker_config_joins_chyme_onto_workdir() {
    std::env::set_var("CH_WORKER_WORKDIR", "/var/lib/worker");
    std::env::set_var("CH_TASK_QUEUE", "chyme-tasks");
    std::env::set_var("CH_TASK_DLQ", "chyme-tasks-dlq");

    let config = WorkerConfig::from_env().unwrap();
    assert_eq!(config.work_dir, "/var/lib/worker/chyme");

    std::env::remove_var("CH_WORKER_WORKDIR");
    std::env::remove_var("CH_TASK_QUEUE");
    std::env::remove_var("CH_TASK_DLQ");
}

#[test]
fn worker_config_joins_chyme_onto_workdir_with_trailing_slash() {
    std::env::set_var("CH_WORKER_WORKDIR", "/var/lib/worker/");
    std::env::set_var("CH_TASK_QUEUE", "chyme-tasks");
    std::env::set_var("CH_TASK_DLQ", "chyme-tasks-dlq");

    let config = WorkerConfig::from_env().unwrap();
    assert_eq!(config.work_dir, "/var/lib/worker/chyme");

    std::env::remove_var("CH_WORKER_WORKDIR");
    std::env::remove_var("CH_TASK_QUEUE");
    std::env::remove_var("CH_TASK_DLQ");
}
