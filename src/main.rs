extern crate clap;
#[macro_use] extern crate log;
extern crate fern;
extern crate chrono;
extern crate term_grid;
extern crate peppermint;

use clap::{Arg, ArgMatches, App};
use term_grid::{Grid, GridOptions, Direction, Filling, Cell};

use peppermint::syntax::{self, ast, NodeKind, Tree};

use std::io::{self, Read};

fn main() {
    let args = process_arguments();
    initialize_logging(args.occurrences_of("verbose"));

    let input = args.value_of("INPUT").unwrap_or("-");
    debug!("Arguments:\n\tVerbosity: {}\n\tTokens: {}\n\tDebug table: {}\n\tInfile: {}",
        level_for(args.occurrences_of("verbose")),
        args.is_present("tokens"),
        args.is_present("print-debug"),
        input
    );

    let source = match read_source(input) {
        Err(err) => {
            error!("fatal: unable to read input `{}`: {}", input, err);
            std::process::exit(1);
        },
        Ok(source) => source,
    };

    let (tree, errors) = syntax::parse(&source);
    info!("parsed {} statement(s) from `{}`", tree.statements().count(), input);

    if args.is_present("tokens") {
        println!("{}", token_grid(&tree).fit_into_columns(4));
    }

    if args.is_present("print-debug") {
        println!("{}", statement_grid(&tree).fit_into_columns(4));
    }

    if !args.is_present("tokens") && !args.is_present("print-debug") {
        println!("{}", tree.to_sexp());
    }

    if !errors.is_empty() {
        for err in &errors {
            error!("{}\n{}", err, err.render(&source));
        }
        error!("Found {} error(s) in `{}`.", errors.len(), input);
        std::process::exit(1);
    }
}

/// Reads the whole input, with `-` standing for stdin.
fn read_source(input: &str) -> io::Result<String> {
    if input == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(input)
    }
}

/// One row per token: position, kind, byte span and text.
fn token_grid(tree: &Tree) -> Grid {
    let mut grid = Grid::new(GridOptions {
        filling:     Filling::Spaces(1),
        direction:   Direction::LeftToRight,
    });

    for tok in tree.tokens() {
        grid.add(Cell::from(format!("{}:{}", tok.line, tok.col)));
        grid.add(Cell::from(format!("{:?}", tok.kind)));
        grid.add(Cell::from(tok.span.to_string()));
        grid.add(Cell::from(format!("{:?}", tree.text(tok.span))));
    }

    grid
}

/// One row per top-level node, error nodes included.
fn statement_grid(tree: &Tree) -> Grid {
    let mut grid = Grid::new(GridOptions {
        filling:     Filling::Spaces(1),
        direction:   Direction::LeftToRight,
    });

    for (idx, id) in tree.top_level().enumerate() {
        let node = tree.node(id);
        let (kind, text) = match ast::Statement::from_node(tree, id) {
            Some(stmt) => (statement_kind(&stmt), stmt.to_string()),
            None => (NodeKind::Error.name(), format!("{:?}", tree.node_text(id))),
        };
        grid.add(Cell::from(format!("0x{:04X}:", idx)));
        grid.add(Cell::from(node.span().to_string()));
        grid.add(Cell::from(kind.to_string()));
        grid.add(Cell::from(text));
    }

    grid
}

fn statement_kind(stmt: &ast::Statement) -> &'static str {
    match stmt {
        ast::Statement::Instruction(_) => NodeKind::Instruction.name(),
        ast::Statement::Literal(_) => NodeKind::Literal.name(),
        ast::Statement::Label(_) => NodeKind::Label.name(),
        ast::Statement::Comment { .. } => NodeKind::Comment.name(),
    }
}

fn process_arguments() -> ArgMatches<'static> {
    App::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(Arg::with_name("INPUT")
            .help("Sets the input file to use, `-` for stdin")
            .required(false)
            .multiple(false)
            .index(1))
        .arg(Arg::with_name("verbose")
            .short("v")
            .multiple(true)
            .takes_value(false)
            .help("Sets the level of verbosity"))
        .arg(Arg::with_name("tokens")
            .short("t")
            .long("tokens")
            .takes_value(false)
            .help("prints every token with its position and span"))
        .arg(Arg::with_name("print-debug")
            .short("d")
            .long("print-debug")
            .alias("show")
            .takes_value(false)
            .help("prints a table of the top-level statements instead of the tree"))
        .get_matches()
}

fn level_for(verbosity: u64) -> log::LevelFilter {
    match verbosity {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

fn initialize_logging(verbosity: u64) {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level_for(verbosity))
        .chain(std::io::stderr())
        .apply().ok();
}
