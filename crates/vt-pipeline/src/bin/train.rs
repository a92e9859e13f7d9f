use tracing_subscriber::EnvFilter;
use vt_pipeline::PipelineConfig;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = PipelineConfig::default();
    if let Some(path) = std::env::args().nth(1) {
        config.data_path = path.into();
    }

    let report = vt_pipeline::run(&config)?;
    println!("{report}");
    Ok(())
}
