#[cfg(unix)]
fn main() -> anyhow::Result<()> {
    vigia_app::daemon::run()
}

#[cfg(not(unix))]
fn main() {
    eprintln!("vigia daemon is only available on Unix-like systems.");
}
