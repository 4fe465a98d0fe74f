use anyhow::Result;
use clap::Parser;
use tracing::info;

use shacl_kernel::config::{CliArgs, KernelConfig};
use shacl_kernel::logging::{LoggingConfig, init_logging};
use shacl_kernel::repl::{self, SharedKernel};
use shacl_kernel::router::Kernel;

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(&LoggingConfig::from_env())?;

    let config = KernelConfig::from_args(args)?;
    let mut kernel = Kernel::new()?;
    config.apply(&mut kernel);
    info!(
        endpoint = config.endpoint.as_ref().map(|url| url.as_str()),
        inference = %config.inference,
        "kernel started"
    );

    repl::run(&SharedKernel::new(kernel))
}
