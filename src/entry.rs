use clap::Parser;
use tracing::info;

use vuload::args::VuloadArgs;
use vuload::config::{all_scenarios, build_plan, load_config};
use vuload::error::AppResult;
use vuload::shutdown::shutdown_channel;

use crate::app;
use crate::shutdown_handlers::setup_signal_shutdown_handler;

pub(crate) fn run() -> AppResult<()> {
    let args = VuloadArgs::parse();

    crate::logger::init_logging(args.verbose, args.no_color);

    let (config, source) = load_config(args.config.as_deref())?;
    info!("Loaded scenarios from {}.", source);

    if args.list {
        let profiles = all_scenarios(&config)?;
        app::print_listing(&profiles, &source);
        return Ok(());
    }

    let plan = build_plan(&config, args.base_url.as_deref(), &args.scenarios)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let (shutdown_tx, _) = shutdown_channel();
        let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);

        let report = app::run_plan(plan, args.request_log.as_deref(), &shutdown_tx).await?;

        drop(shutdown_tx.send(()));
        signal_handle.await?;
        app::print_report(&report, args.output_format)
    })
}
