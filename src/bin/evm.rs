use anyhow::Context;
use clap::Parser;
use evm_tools::{logging, EvmArgs, Runner};

fn main() {
    let args = EvmArgs::parse();
    logging::init(logging::level_for(args.verbosity, args.debug));
    if let Err(e) = run(args) {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

fn run(args: EvmArgs) -> anyhow::Result<()> {
    let config = args.into_config()?;
    let runner = Runner::open(&config).context("open state")?;
    let outcome = runner.run(&config)?;

    println!("ROOT: 0x{}", hex::encode(outcome.root));
    if config.dump {
        println!("{}", outcome.state.to_json_pretty()?);
    }
    if config.sysstat {
        println!("vm took {:?}", outcome.elapsed);
        println!("gas used: {}", outcome.gas_used);
    }
    let out = hex::encode(&outcome.output);
    match &outcome.failure {
        Some(reason) => println!("OUT: 0x{out} error: {reason}"),
        None => println!("OUT: 0x{out}"),
    }
    Ok(())
}
