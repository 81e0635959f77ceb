// Copyright (c) 2018 Fabian Schuiki
#[macro_use]
extern crate clap;

use std::error::Error;
use std::fs::File;
use std::process;
use std::str;

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use log::{debug, trace};
use memmap::Mmap;

use lrkit::builder::ParserBuilder;
use lrkit::checkers::LexerBuilder;
use lrkit::grammar::{Grammar, RuleId, RuleText};
use lrkit::input::TokenInput;
use lrkit::lexer::{Lexer, ScanResultInfo};
use lrkit::runtime::{GrammarRule, RuleTag, ValueStack};
use lrkit::source::StringSource;
use lrkit::token::{kind, Token};

type Result<T> = std::result::Result<T, Box<dyn Error>>;

fn main() {
    let matches = App::new(crate_name!())
        .version(crate_version!())
        .author(crate_authors!())
        .about(crate_description!())
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("verbosity")
                .short("v")
                .multiple(true)
                .global(true)
                .help("Increase message verbosity"),
        )
        .arg(
            Arg::with_name("quiet")
                .short("q")
                .global(true)
                .help("Silence all log messages"),
        )
        .subcommand(
            SubCommand::with_name("tokens")
                .about("Dump the tokens the default tokenizer finds in a text")
                .arg(Arg::with_name("TEXT").required(true)),
        )
        .subcommand(
            SubCommand::with_name("tables")
                .about("Dump the rules, first sets, item sets, and tables of a grammar")
                .arg(Arg::with_name("GRAMMAR").required(true)),
        )
        .subcommand(
            SubCommand::with_name("parse")
                .about("Parse a text with the parser generated from a grammar")
                .arg(Arg::with_name("GRAMMAR").required(true))
                .arg(Arg::with_name("TEXT").required(true)),
        )
        .get_matches();

    let logger = stderrlog::new()
        .module(module_path!())
        .module("lrkit_runtime")
        .quiet(matches.is_present("quiet"))
        .verbosity(matches.occurrences_of("verbosity") as usize + 1)
        .init();
    if let Err(e) = logger {
        eprintln!("cannot install logger: {}", e);
    }

    let result = match matches.subcommand() {
        ("tokens", Some(m)) => dump_tokens(m),
        ("tables", Some(m)) => dump_tables(m),
        ("parse", Some(m)) => parse(m),
        _ => Ok(()),
    };
    if let Err(e) = result {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn default_lexer() -> Lexer {
    LexerBuilder::new()
        .with_default_states()
        .with_standard_operators()
        .build()
}

fn dump_tokens(matches: &ArgMatches) -> Result<()> {
    let text = matches.value_of("TEXT").unwrap_or_default();
    let lexer = default_lexer();
    let mut source = StringSource::new(text);
    let mut info = ScanResultInfo::default();
    while let Some(token) = lexer.next(&mut source, &mut info, kind::NONE)? {
        println!(
            "{}:{}\t{}\t{}\t{}",
            info.line,
            info.col,
            token.id(),
            token.info().value,
            token.value()
        );
    }
    Ok(())
}

/// Read a grammar file. Every line that is neither blank nor a `#` comment
/// is a rule, tagged with its index.
fn load_rules(path: &str) -> Result<Vec<RuleText>> {
    let file = File::open(path)?;
    let rules = if file.metadata()?.len() == 0 {
        Vec::new()
    } else {
        let map = unsafe { Mmap::map(&file)? };
        str::from_utf8(&map)?
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .enumerate()
            .map(|(index, line)| RuleText::new(line, index as RuleTag))
            .collect()
    };
    debug!("read {} rules from {}", rules.len(), path);
    Ok(rules)
}

fn compile(path: &str) -> Result<ParserBuilder> {
    let rules = load_rules(path)?;
    let mut builder = ParserBuilder::new();
    builder.declare_nonterminals(&rules)?;
    builder.load_grammar(&rules)?;
    Ok(builder)
}

fn dump_tables(matches: &ArgMatches) -> Result<()> {
    let builder = compile(matches.value_of("GRAMMAR").unwrap_or_default())?;
    let grammar = builder.grammar();

    println!("Rules:");
    for index in 0..grammar.len() {
        println!("    {}: {}", index, RuleId::from_usize(index).pretty(grammar));
    }
    println!("\nFirst sets:\n{}", builder.first_sets().pretty(grammar));
    println!("\nItem sets:\n{}", builder.item_sets().pretty(grammar));
    println!("\nTables:\n{}", builder.machine().pretty(grammar));
    if !builder.conflicts().is_empty() {
        println!("\nConflicts:");
        for conflict in builder.conflicts() {
            println!("    {}", conflict.pretty(grammar));
        }
    }
    Ok(())
}

/// Builds a bracketed rendering of the parse tree.
struct TreeStack<'a> {
    grammar: &'a Grammar,
    values: Vec<String>,
}

impl<'a> ValueStack<Token> for TreeStack<'a> {
    fn push_term(&mut self, token: &Token) {
        println!("shift {}", token);
        self.values.push(token.value().to_string());
    }

    fn push_reduced(&mut self, rule: &GrammarRule) -> bool {
        if rule.rhs_len > self.values.len() {
            return false;
        }
        let at = self.values.len() - rule.rhs_len;
        let children = self.values.split_off(at);
        let name = self.grammar.name(rule.lhs);
        println!("reduce r{} to {}", rule.tag, name);
        trace!("{} values left", self.values.len());
        self.values
            .push(format!("({} {})", name, children.join(" ")));
        true
    }

    fn pop(&mut self) -> bool {
        self.values.pop().is_some()
    }
}

fn parse(matches: &ArgMatches) -> Result<()> {
    let builder = compile(matches.value_of("GRAMMAR").unwrap_or_default())?;
    let lexer = default_lexer();
    let text = matches.value_of("TEXT").unwrap_or_default();
    let mut input = TokenInput::new(&lexer, StringSource::new(text));
    let mut values = TreeStack {
        grammar: builder.grammar(),
        values: Vec::new(),
    };
    builder.build().parse(&mut input, &mut values, 0)?;
    println!("accept");
    for value in &values.values {
        println!("{}", value);
    }
    Ok(())
}
