// src/main.rs
fn main() -> anyhow::Result<()> {
    env_logger::init();
    pacelink::cli::run()
}
