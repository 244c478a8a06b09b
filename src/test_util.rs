/// Runs `func` with `HOME` and the base-dir override pointing at a fresh
/// temporary directory. Calls are serialized because they mutate the process
/// environment.
#[cfg(test)]
pub(crate) fn with_temp_base_dir<F, R>(func: F) -> R
where
    F: FnOnce(&std::path::Path) -> R,
{
    static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let dir = tempfile::tempdir().expect("tempdir");
    let old_home = std::env::var("HOME").ok();
    let old_base = std::env::var(crate::paths::BASE_DIR_ENV).ok();
    // SAFETY: every test touching these variables holds ENV_MUTEX.
    unsafe {
        std::env::set_var("HOME", dir.path());
        std::env::set_var(crate::paths::BASE_DIR_ENV, dir.path());
    }
    let result = func(dir.path());
    unsafe {
        restore_var("HOME", old_home);
        restore_var(crate::paths::BASE_DIR_ENV, old_base);
    }
    result
}

#[cfg(test)]
unsafe fn restore_var(key: &str, value: Option<String>) {
    match value {
        Some(value) => unsafe { std::env::set_var(key, value) },
        None => unsafe { std::env::remove_var(key) },
    }
}
