//! # prop-solver
//!
//! `prop-solver` is a command-line front-end for the propositional logic
//! engine. It parses formulas and clause sets from plain text, runs the
//! normal form rewriting or the DPLL search, and prints the resulting
//! derivation: the step-by-step trace for normal forms, the decision tree
//! for satisfiability.
//!
//! ## Subcommands
//!
//! 1.  **`nf`**: Rewrite a formula into conjunctive or disjunctive normal
//!     form and print every intermediate step.
//!     ```sh
//!     prop-solver nf --formula "A && B || !A && C" --form cnf
//!     ```
//!
//! 2.  **`sat`**: Solve a clause set and print the decision tree.
//!     ```sh
//!     prop-solver sat --input "{p, q}{!p, q}{p, !q}"
//!     ```
//!
//! 3.  **`table`**: Print the truth table of a formula.
//!     ```sh
//!     prop-solver table --formula "a -> b"
//!     ```
//!
//! 4.  **`completions`**: Generate shell completion scripts.
//!
//! ### Common options
//!
//! -   `-d, --debug`: Enable debug output.
//! -   `-s, --stats`: Enable printing of statistics (default: `true`).
//! -   `-p, --print-model`: Print the satisfying assignment, if any.
//!
//! The formula grammar is infix: `!`, `&&`, `||`, `->`, `<->`, `^`,
//! parentheses, `1`/`0` constants and alphanumeric variable names. Clause
//! sets are written `{lit, lit}{...}` with `!` marking negative literals.

use clap::{Args, CommandFactory, Parser, Subcommand};
use prop_solver::logic::clause::ClauseSet;
use prop_solver::logic::dpll::{dpll, DpllNode, Reason};
use prop_solver::logic::formula::Formula;
use prop_solver::logic::normal_form::{to_nf, NormalForm};
use prop_solver::logic::parser::{parse_clause_set, parse_formula};
use prop_solver::logic::truth_table::TruthTable;
use std::fmt::Write as _;
use std::time::Duration;
use tikv_jemalloc_ctl::{epoch, stats};

/// Global allocator using `tikv-jemallocator`, matching the library's
/// memory usage reporting below.
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// Defines the command-line interface for the prop-solver application.
///
/// Uses `clap` for parsing arguments.
#[derive(Parser, Debug)]
#[command(name = "prop-solver", version, about = "A propositional logic engine")]
struct Cli {
    /// Specifies the subcommand to execute.
    #[clap(subcommand)]
    command: Commands,
}

/// Enumerates the available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Rewrite a formula into normal form, printing every step.
    Nf {
        /// The formula, in infix notation (e.g. "a && b -> c").
        #[arg(short, long)]
        formula: String,

        /// The normal form to rewrite into.
        #[arg(long, value_enum, default_value_t = FormArg::Cnf)]
        form: FormArg,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve a clause set with DPLL and print the decision tree.
    Sat {
        /// The clause set (e.g. "{p, q}{!p, q}").
        #[arg(short, long)]
        input: String,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Print the truth table of a formula.
    Table {
        /// The formula, in infix notation.
        #[arg(short, long)]
        formula: String,
    },

    /// Generate shell completion scripts.
    Completions {
        /// The shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// The normal form requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum FormArg {
    /// Conjunctive normal form.
    Cnf,
    /// Disjunctive normal form.
    Dnf,
}

impl From<FormArg> for NormalForm {
    fn from(arg: FormArg) -> Self {
        match arg {
            FormArg::Cnf => Self::Conjunctive,
            FormArg::Dnf => Self::Disjunctive,
        }
    }
}

/// Defines common command-line options shared across subcommands.
#[derive(Args, Debug, Default)]
struct CommonOptions {
    /// Enable debug output.
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// Enable printing of statistics after solving.
    #[arg(short, long, default_value_t = true)]
    stats: bool,

    /// Print the satisfying assignment, if one exists.
    #[arg(short, long, default_value_t = false)]
    print_model: bool,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Nf {
            formula,
            form,
            common,
        } => {
            let parsed = parse_or_exit(&formula);
            run_nf(&parsed, form.into(), &common);
        }
        Commands::Sat { input, common } => {
            let time = std::time::Instant::now();
            let clauses = match parse_clause_set(&input) {
                Ok(clauses) => clauses,
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(1);
                }
            };
            let parse_time = time.elapsed();
            run_sat(&clauses, &common, parse_time);
        }
        Commands::Table { formula } => {
            let parsed = parse_or_exit(&formula);
            print_table(&parsed);
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            let name = command.get_name().to_string();
            clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
        }
    }
}

fn parse_or_exit(input: &str) -> Formula {
    match parse_formula(input) {
        Ok(formula) => formula,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

/// Rewrites the formula and prints the numbered derivation.
fn run_nf(formula: &Formula, form: NormalForm, common: &CommonOptions) {
    if common.debug {
        println!("Input: {formula}");
        println!("Variables: {}", formula.variables().len());
        println!("Nodes: {}", formula.node_count());
    }

    let time = std::time::Instant::now();
    let trace = to_nf(formula, form);
    let elapsed = time.elapsed();

    for (i, step) in trace.iter().enumerate() {
        println!("{i:>3}. {step}");
    }

    if common.stats {
        println!("\n=======================[ Rewriting Statistics ]======================");
        stat_line("Steps", trace.len() - 1);
        stat_line(
            "Result nodes",
            trace.last().map_or(0, Formula::node_count),
        );
        stat_line("CPU time (s)", format!("{:.3}", elapsed.as_secs_f64()));
        print_memory_stats();
        println!("=====================================================================");
    }
}

/// Solves the clause set and prints the decision tree and verdict.
fn run_sat(clauses: &ClauseSet, common: &CommonOptions, parse_time: Duration) {
    if common.debug {
        println!("Clauses: {clauses}");
        println!("Variables: {}", clauses.variables().len());
    }

    let time = std::time::Instant::now();
    let tree = dpll(clauses);
    let elapsed = time.elapsed();

    print!("{}", render_tree(&tree));

    let model = tree.satisfying_assignment();

    if let Some(model) = &model {
        // The tree's own bookkeeping must agree with the model it yields.
        assert!(
            clauses.is_satisfied_by(model),
            "model failed verification against the input clause set"
        );

        if common.print_model {
            let mut names: Vec<_> = model.keys().collect();
            names.sort();
            let rendered = names
                .iter()
                .map(|name| format!("{name}={}", model[*name]))
                .collect::<Vec<_>>()
                .join(", ");
            println!("Model: {rendered}");
        }
    }

    if common.stats {
        println!("\n========================[ Search Statistics ]========================");
        stat_line("Parse time (s)", format!("{:.3}", parse_time.as_secs_f64()));
        stat_line("Clauses", clauses.len());
        stat_line("Variables", clauses.variables().len());
        stat_line("Tree nodes", tree.node_count());
        stat_line("Decisions", tree.decisions());
        stat_line("Propagations", tree.propagations());
        stat_line("CPU time (s)", format!("{:.3}", elapsed.as_secs_f64()));
        print_memory_stats();
        println!("=====================================================================");
    }

    if tree.is_satisfiable() {
        println!("\nSATISFIABLE");
    } else {
        println!("\nUNSATISFIABLE");
    }
}

/// Prints the truth table of a formula, one row per interpretation.
fn print_table(formula: &Formula) {
    let table = TruthTable::new(formula);

    for name in table.variables() {
        print!("{name} ");
    }
    println!("| {formula}");

    for row in 0..table.rows() {
        let interpretation = table.interpretation(row);
        for name in table.variables() {
            print!("{:>width$} ", u8::from(interpretation[name]), width = name.len());
        }
        println!("| {}", u8::from(table.result(row)));
    }
}

/// Renders the decision tree with one line per node, indented by depth.
fn render_tree(node: &DpllNode) -> String {
    let mut out = String::new();
    render_node(node, 0, &mut out);
    out
}

fn render_node(node: &DpllNode, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match node {
        DpllNode::Terminal { clauses } => {
            if clauses.is_empty() {
                let _ = writeln!(out, "{indent}[satisfied]");
            } else {
                let _ = writeln!(out, "{indent}[conflict] {clauses}");
            }
        }
        DpllNode::Deterministic {
            clauses,
            literal,
            reason,
            next,
        } => {
            let label = match reason {
                Reason::UnitPropagation => "unit",
                Reason::PureLiteral => "pure",
            };
            let _ = writeln!(
                out,
                "{indent}{} = {} ({label})  {clauses}",
                literal.name(),
                literal.satisfying_value()
            );
            render_node(next, depth, out);
        }
        DpllNode::Branch {
            clauses,
            variable,
            if_true,
            if_false,
        } => {
            let _ = writeln!(out, "{indent}branch on {variable}  {clauses}");
            let _ = writeln!(out, "{indent}{variable} = true:");
            render_node(if_true, depth + 1, out);
            if let Some(if_false) = if_false {
                let _ = writeln!(out, "{indent}{variable} = false:");
                render_node(if_false, depth + 1, out);
            }
        }
    }
}

/// Helper function to print a single statistic line in a formatted table
/// row.
fn stat_line(label: &str, value: impl std::fmt::Display) {
    println!("|  {label:<28} {value:>18}  |");
}

/// Reads allocation statistics from jemalloc and prints them as table
/// rows.
fn print_memory_stats() {
    epoch::advance().unwrap();
    let allocated_bytes = stats::allocated::mib().unwrap().read().unwrap();
    let resident_bytes = stats::resident::mib().unwrap().read().unwrap();
    let allocated_mib = allocated_bytes as f64 / (1024.0 * 1024.0);
    let resident_mib = resident_bytes as f64 / (1024.0 * 1024.0);

    stat_line("Memory usage (MiB)", format!("{allocated_mib:.2}"));
    stat_line("Resident memory (MiB)", format!("{resident_mib:.2}"));
}
