use lstar::prelude::*;

use tracing::{debug, error, info, trace};
use tracing_subscriber::{filter, prelude::*};

use clap::{value_parser, Arg, ArgMatches, Command};

fn cli() -> clap::Command {
    Command::new("lstar")
        .about("Learns the five state example DFA from Angluin's paper and prints the result")
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbosity")
                .num_args(0..=1)
                .require_equals(true)
                .value_parser(["info", "debug", "trace"])
                .default_missing_value("info"),
        )
        .arg(
            Arg::new("algorithm")
                .short('a')
                .long("algorithm")
                .value_parser(["classic", "rivest-schapire"])
                .default_value("classic")
                .help("how counterexamples are processed"),
        )
        .arg(
            Arg::new("method")
                .short('m')
                .long("method")
                .value_parser(["w", "wp"])
                .default_value("wp")
                .help("conformance testing method used to search for counterexamples"),
        )
        .arg(
            Arg::new("depth")
                .short('d')
                .long("depth")
                .value_parser(value_parser!(usize))
                .default_value("4")
                .help("maximal length of the middle part of test words"),
        )
        .arg(
            Arg::new("max-rounds")
                .long("max-rounds")
                .value_parser(value_parser!(usize))
                .help("stop after constructing this many hypotheses"),
        )
        .arg(
            Arg::new("log-models")
                .long("log-models")
                .action(clap::ArgAction::SetTrue)
                .help("log every intermediate hypothesis"),
        )
}

fn setup_logging(matches: &ArgMatches) {
    let level = match matches
        .try_get_one::<String>("verbosity")
        .ok()
        .flatten()
        .map(|m| m.as_str())
    {
        Some("trace") => filter::LevelFilter::TRACE,
        Some("debug") => filter::LevelFilter::DEBUG,
        Some("info") => filter::LevelFilter::INFO,
        _ => filter::LevelFilter::WARN,
    };

    let stderr_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(stderr_log.with_filter(level))
        .init();

    trace!("setup {level} logging");
}

/// The target of the example, states s1 to s5 of the paper are numbered 0 to 4.
fn target() -> Result<Dfa<char>> {
    Dfa::builder(CharAlphabet::characters('a', 'b')?)
        .with_state_colors([false, true, false, true, false])
        .with_edges([
            (0, 'a', 1),
            (0, 'b', 3),
            (1, 'a', 3),
            (1, 'b', 2),
            (2, 'a', 0),
            (2, 'b', 2),
            (3, 'a', 4),
            (3, 'b', 3),
            (4, 'a', 1),
            (4, 'b', 4),
        ])
        .into_dfa(0)
}

fn report<S, O, H, E>(
    mut experiment: Experiment<S, O, H, E>,
    counter: &CounterOracle<SimulatorOracle<S>>,
) -> Result<()>
where
    S: Symbol,
    O: MembershipOracle<S>,
    H: CounterexampleHandler<S>,
    E: EquivalenceOracle<S>,
{
    let result = experiment.run()?;
    if let Outcome::Converged { depth } = result.outcome {
        info!("no counterexample found up to depth {depth:?}");
    } else {
        info!("stopped before testing succeeded");
    }

    println!("-------------------------------------------------------");
    println!("{}", result.statistics.summary());
    println!("{}", counter.statistics());
    println!("states: {}", result.hypothesis.size());
    println!("sigma: {}", result.hypothesis.alphabet().size());
    println!();
    println!("Model: ");
    println!("{}", result.hypothesis);
    println!();
    println!("Final observation table:");
    println!("{}", experiment.learner().observation_table());
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<()> {
    let target = target()?;
    let alphabet = target.alphabet().clone();
    let depth = *matches.get_one::<usize>("depth").expect("has a default");
    let mut config = ExperimentConfig::default().with_log_models(matches.get_flag("log-models"));
    if let Some(rounds) = matches.get_one::<usize>("max-rounds") {
        config = config.with_max_rounds(*rounds);
    }
    let algorithm = matches
        .get_one::<String>("algorithm")
        .map(String::as_str)
        .unwrap_or("classic");
    let method = matches
        .get_one::<String>("method")
        .map(String::as_str)
        .unwrap_or("wp");
    debug!("learning with {algorithm} and the {method} method at depth {depth}");

    let sul = CounterOracle::new(SimulatorOracle::new(target), "membership queries");
    match (algorithm, method) {
        ("rivest-schapire", "w") => report(
            Experiment::new(
                Learner::rivest_schapire(alphabet, &sul),
                WMethodOracle::new(&sul, depth),
            )
            .with_config(config),
            &sul,
        ),
        ("rivest-schapire", _) => report(
            Experiment::new(
                Learner::rivest_schapire(alphabet, &sul),
                WpMethodOracle::new(&sul, depth),
            )
            .with_config(config),
            &sul,
        ),
        (_, "w") => report(
            Experiment::new(Learner::classic(alphabet, &sul), WMethodOracle::new(&sul, depth))
                .with_config(config),
            &sul,
        ),
        _ => report(
            Experiment::new(Learner::classic(alphabet, &sul), WpMethodOracle::new(&sul, depth))
                .with_config(config),
            &sul,
        ),
    }
}

pub fn main() {
    let matches = cli().get_matches();
    setup_logging(&matches);

    if let Err(e) = run(&matches) {
        error!("learning failed: {e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
