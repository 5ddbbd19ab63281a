use clap::Parser as ClapParser;
use tracing_subscriber::EnvFilter;

use scaffold::core::hint::TemplateRegistry;
use scaffold::core::lexer::{Lexer, Token};
use scaffold::core::policy::Tier;
use scaffold::core::unit::{SourceUnit, UnitKind};
use scaffold::core::verify::VerifierConfig;
use scaffold::driver::ConversionEngine;

#[derive(ClapParser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Python source file containing one reference implementation
    file: std::path::PathBuf,

    /// Declared kind: function, class, algorithm, test
    #[clap(long, default_value = "function")]
    kind: String,

    /// Declared tier: detailed, moderate, minimal
    #[clap(long, default_value = "detailed")]
    tier: String,

    /// Identifier carried through logs and reports
    #[clap(long, default_value = "cli")]
    context_id: String,

    /// Comma-separated list of things to dump: tokens,tree,features,scaffold,report
    #[clap(long)]
    dump: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let Some(kind) = parse_kind(&args.kind) else {
        eprintln!("[ERROR] unknown kind: {}", args.kind);
        std::process::exit(1);
    };
    let Some(tier) = parse_tier(&args.tier) else {
        eprintln!("[ERROR] unknown tier: {}", args.tier);
        std::process::exit(1);
    };
    let source = match std::fs::read_to_string(&args.file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("[ERROR] failed to read {}: {e}", args.file.display());
            std::process::exit(1);
        }
    };

    let mut dump_tokens = false;
    let mut dump_tree = false;
    let mut dump_features = false;
    let mut dump_scaffold = false;
    let mut dump_report = false;
    if let Some(dump) = &args.dump {
        for item in dump.split(',').map(|s| s.trim().to_lowercase()) {
            match item.as_str() {
                "tokens" => dump_tokens = true,
                "tree" => dump_tree = true,
                "features" => dump_features = true,
                "scaffold" => dump_scaffold = true,
                "report" => dump_report = true,
                "" => {}
                _ => eprintln!("[WARN] unknown dump flag: {item}"),
            }
        }
    } else {
        dump_scaffold = true;
        dump_report = true;
    }

    if dump_tokens {
        println!("--- tokens ---");
        for result in Lexer::new(&source).tokenize() {
            match result {
                Ok(Token { kind, span }) => println!("{span}  {kind}"),
                Err(e) => println!("{span}  [lex error] {e}", span = e.span()),
            }
        }
    }

    let unit = SourceUnit::new(source, kind, tier, args.context_id);
    let engine = ConversionEngine::new(TemplateRegistry::builtin(), VerifierConfig::default());
    let report = engine.convert_unit(&unit);

    if dump_tree || dump_features {
        // The report does not carry the tree; re-run analysis for the dump.
        use scaffold::core::analyze::{PythonAnalyzer, StructuralAnalyzer};
        match PythonAnalyzer.analyze(&unit.source_text, kind) {
            Ok(analyzed) => {
                if dump_tree {
                    println!("--- tree ---");
                    println!("{:#?}", analyzed.tree);
                }
                if dump_features {
                    println!("--- features ---");
                    println!("{:#?}", analyzed.features);
                }
            }
            Err(e) => eprintln!("[ERROR] {e}"),
        }
    }

    if dump_scaffold {
        if let Some(code) = &report.scaffolded_code {
            println!("--- scaffold ---");
            println!("{}", code.body);
        }
    }
    if dump_report {
        println!("--- report ---");
        print!("{report}");
    }

    if report.status == scaffold::driver::Status::Failed {
        std::process::exit(1);
    }
}

fn parse_kind(text: &str) -> Option<UnitKind> {
    match text.to_lowercase().as_str() {
        "function" => Some(UnitKind::Function),
        "class" => Some(UnitKind::Class),
        "algorithm" => Some(UnitKind::Algorithm),
        "test" => Some(UnitKind::Test),
        _ => None,
    }
}

fn parse_tier(text: &str) -> Option<Tier> {
    match text.to_lowercase().as_str() {
        "detailed" | "tier_1" | "1" => Some(Tier::Detailed),
        "moderate" | "tier_2" | "2" => Some(Tier::Moderate),
        "minimal" | "tier_3" | "3" => Some(Tier::Minimal),
        _ => None,
    }
}
