fn main() -> anyhow::Result<()> {
    routebind::cli::run_cli()
}
