mod cmd;
mod util;

use anyhow::Result;
use clap::{CommandFactory, FromArgMatches};
use power_probe::{BackendKind, Session, SessionConfig};

#[derive(clap::Parser)]
#[clap(
    name = "power-probe",
    about = "Debug-probe tool for POWER-style hardware",
    version
)]
struct Cli {
    /// Processor to run on. May be repeated; later -c/-t selectors bind to
    /// the most recent -p.
    #[clap(
        short = 'p',
        long = "processor",
        value_name = "ID",
        value_parser = util::parse_u32,
        help_heading = "TARGET SELECTION"
    )]
    processor: Vec<u32>,
    /// Chip to run on, within the most recent -p.
    #[clap(
        short = 'c',
        long = "chip",
        value_name = "ID",
        value_parser = util::parse_u32,
        help_heading = "TARGET SELECTION"
    )]
    chip: Vec<u32>,
    /// Thread to run on, within the most recent -p/-c pair.
    #[clap(
        short = 't',
        long = "thread",
        value_name = "ID",
        value_parser = util::parse_u32,
        help_heading = "TARGET SELECTION"
    )]
    thread: Vec<u32>,
    /// Run on all possible processors/chips/threads (the default when no
    /// selector is given).
    #[clap(short = 'a', long, help_heading = "TARGET SELECTION")]
    all: bool,

    /// Backend to reach the hardware through.
    #[clap(
        short = 'b',
        long,
        default_value = "kernel",
        help_heading = "BACKEND"
    )]
    backend: BackendKind,
    /// Backend device: the board type for fsi/host (e.g. p8, p9w,
    /// witherspoon), the bus node for i2c (defaults to /dev/i2c4).
    #[clap(short = 'd', long, value_name = "DEVICE", help_heading = "BACKEND")]
    device: Option<String>,
    /// Device slave address for the i2c backend.
    #[clap(
        short = 's',
        long,
        value_name = "ADDR",
        value_parser = util::parse_u16,
        default_value = "0x50",
        help_heading = "BACKEND"
    )]
    slave_address: u16,

    #[clap(subcommand)]
    subcommand: Subcommand,
}

#[derive(clap::Subcommand)]
enum Subcommand {
    /// Display the selected targets of the loaded topology
    Probe(cmd::probe::Cmd),
    /// Summarize target classes and their enabled members
    Targets(cmd::targets::Cmd),
}

fn main() -> Result<()> {
    setup_logging();

    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches)?;
    let selection = util::selection_from_matches(&matches, cli.all)?;

    tracing::debug!(backend = %cli.backend, device = ?cli.device, "attaching");
    let session = Session::attach(SessionConfig {
        backend: cli.backend,
        device: cli.device.clone(),
        slave_address: cli.slave_address,
        selection,
    })?;

    let count = match &cli.subcommand {
        Subcommand::Probe(cmd) => cmd.run(&session)?,
        Subcommand::Targets(cmd) => cmd.run(&session)?,
    };

    session.close()?;

    if count == 0 {
        println!(
            "No valid targets found or specified. Try adding -p/-c/-t options to specify a target."
        );
        println!("Alternatively run 'power-probe -a probe' to get a list of all valid targets.");
        std::process::exit(1);
    }

    Ok(())
}

fn setup_logging() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use power_probe::schema::{BackendKind, NodeDescription, Topology};
    use power_probe::{DeviceTree, TargetStatus};

    use super::{util, Cli};

    fn node(name: &str, class: &str, index: i32) -> NodeDescription {
        NodeDescription {
            name: name.to_string(),
            class: class.to_string(),
            index,
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    fn platform() -> DeviceTree {
        let mut root = node("/", "root", -1);
        for p in 0..2 {
            let mut pib = node(&format!("pib{p}"), "pib", p);
            for c in 0..2 {
                let mut chiplet = node(&format!("core{c}"), "chiplet", c);
                for t in 0..2 {
                    chiplet.children.push(node(&format!("thread{t}"), "thread", t));
                }
                pib.children.push(chiplet);
            }
            root.children.push(pib);
        }
        DeviceTree::from_description(&Topology {
            name: "test".to_string(),
            backend: BackendKind::Fake,
            variant: None,
            aliases: Vec::new(),
            classes: Vec::new(),
            root,
        })
        .unwrap()
    }

    fn selection_for(args: &[&str]) -> power_probe::Selection {
        let mut argv = vec!["power-probe"];
        argv.extend_from_slice(args);
        argv.push("probe");
        let matches = Cli::command().try_get_matches_from(argv).unwrap();
        util::selection_from_matches(&matches, matches.get_flag("all")).unwrap()
    }

    fn enabled(tree: &DeviceTree, class: &str) -> usize {
        tree.targets_of_class(class)
            .unwrap()
            .filter(|&id| tree.status(id).unwrap() == TargetStatus::Enabled)
            .count()
    }

    #[test]
    fn no_selectors_select_everything() {
        let mut tree = platform();
        selection_for(&[]).apply(&mut tree).unwrap();
        assert_eq!(enabled(&tree, "thread"), 8);
    }

    #[test]
    fn selectors_bind_to_the_most_recent_higher_level() {
        // Thread 0 of chip 1 of processor 0, plus all of processor 1.
        let mut tree = platform();
        selection_for(&["-p", "0", "-c", "1", "-t", "0", "-p", "1"])
            .apply(&mut tree)
            .unwrap();

        assert_eq!(enabled(&tree, "pib"), 2);
        assert_eq!(enabled(&tree, "chiplet"), 3);
        assert_eq!(enabled(&tree, "thread"), 5);
    }

    #[test]
    fn chip_selector_requires_a_processor() {
        let matches = Cli::command()
            .try_get_matches_from(["power-probe", "-c", "1", "probe"])
            .unwrap();
        assert!(util::selection_from_matches(&matches, false).is_err());
    }

    #[test]
    fn hex_selectors_parse() {
        let mut tree = platform();
        selection_for(&["-p", "0x1"]).apply(&mut tree).unwrap();
        assert_eq!(enabled(&tree, "pib"), 1);
    }
}
