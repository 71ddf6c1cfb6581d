use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use genera_config::GeneraConfig;
use genera_loader::{load_model, load_model_file, Model, ModelFile};
use genera_types::{
    common_type, render_generics, render_hierarchy, render_type, track_root_generics,
    GenericsMap, GenericsResolver, Type, TypeDisplay, TypeEnv,
};
use serde_json::{Map, Value};

#[derive(Parser)]
#[command(
    name = "genera",
    version,
    about = "Java generics resolution over declarative class models"
)]
struct Cli {
    /// Path to a `genera.toml` config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the resolved generics of every type in a class hierarchy
    Hierarchy(HierarchyArgs),
    /// Print the common supertype of two types
    Common(CommonArgs),
    /// Infer the generics of a class from the binding of one of its supertypes
    Track(TrackArgs),
    /// Print the JSON schema of the config file
    Schema,
}

#[derive(Args)]
struct HierarchyArgs {
    /// Class model file (.json or .toml)
    #[arg(long)]
    model: PathBuf,
    /// Root class
    #[arg(long)]
    root: String,
    /// Types to exclude from the hierarchy, together with their own supertypes
    #[arg(long = "ignore")]
    ignore: Vec<String>,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct CommonArgs {
    /// Class model file; only the built-in JDK classes are available without one
    #[arg(long)]
    model: Option<PathBuf>,
    /// First type signature
    first: String,
    /// Second type signature
    second: String,
    /// Include every shared interface, not just the closest common class
    #[arg(long)]
    interfaces: bool,
}

#[derive(Args)]
struct TrackArgs {
    /// Class model file (.json or .toml)
    #[arg(long)]
    model: PathBuf,
    /// Class whose generics are inferred
    #[arg(long)]
    root: String,
    /// Known supertype binding, e.g. `java.util.List<String>`
    #[arg(long)]
    known: String,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => GeneraConfig::load_from_path(path)?,
        None => GeneraConfig::default(),
    };
    genera_config::init_tracing(&config.logging);

    match cli.command {
        Command::Hierarchy(args) => hierarchy(&config, args),
        Command::Common(args) => common(args),
        Command::Track(args) => track(args),
        Command::Schema => {
            let schema = serde_json::to_string_pretty(&genera_config::json_schema())?;
            println!("{schema}");
            Ok(())
        }
    }
}

fn hierarchy(config: &GeneraConfig, args: HierarchyArgs) -> Result<()> {
    let model = open_model(&args.model)?;
    let env = model.store();
    let root = model.class(&args.root)?;
    let ignored = args
        .ignore
        .iter()
        .map(|name| model.class(name))
        .collect::<Result<Vec<_>, _>>()?;

    let resolver = GenericsResolver::with_policy(env, config.cache.policy());
    let context = if ignored.is_empty() {
        resolver.resolve(root)
    } else {
        resolver.resolve_ignoring(root, &ignored)
    }
    .with_context(|| format!("failed to resolve the hierarchy of {}", args.root))?;
    let hierarchy = context.hierarchy();
    tracing::debug!(
        target = "genera.cli",
        root = %args.root,
        types = hierarchy.len(),
        "resolved hierarchy"
    );

    if args.json {
        let mut out = Map::new();
        for (class, generics) in hierarchy.iter() {
            let name = env
                .class(class)
                .map(|def| def.name.clone())
                .unwrap_or_default();
            out.insert(name, Value::Object(generics_json(env, generics)));
        }
        print_json(&Value::Object(out))
    } else {
        print!("{}", render_hierarchy(env, hierarchy, None));
        Ok(())
    }
}

fn common(args: CommonArgs) -> Result<()> {
    let model = match &args.model {
        Some(path) => open_model(path)?,
        None => load_model(&ModelFile::default())?,
    };
    let env = model.store();
    let first = model.parse_type(&args.first)?;
    let second = model.parse_type(&args.second)?;

    let common = common_type(env, &first, &second, args.interfaces)?;
    println!("{}", render_type(env, &common));
    Ok(())
}

fn track(args: TrackArgs) -> Result<()> {
    let model = open_model(&args.model)?;
    let env = model.store();
    let root = model.class(&args.root)?;
    let known = model.parse_type(&args.known)?;

    let (known_class, known_generics) = match &known {
        Type::Parameterized(p) => {
            let names = env
                .class(p.raw)
                .map(|def| def.type_params.clone())
                .unwrap_or_default()
                .into_iter()
                .filter_map(|var| env.type_param(var).map(|param| param.name.clone()));
            let generics: GenericsMap = names.zip(p.args.iter().cloned()).collect();
            (p.raw, generics)
        }
        Type::Class(class) => match class.declared() {
            Some(id) => (id, GenericsMap::new()),
            None => bail!("known type `{}` is not a class type", args.known),
        },
        _ => bail!("known type `{}` is not a class type", args.known),
    };

    let generics = track_root_generics(env, root, known_class, &known_generics)?;
    if args.json {
        print_json(&Value::Object(generics_json(env, &generics)))
    } else {
        println!("{}", render_generics(env, &generics));
        Ok(())
    }
}

fn open_model(path: &Path) -> Result<Model> {
    load_model_file(path).with_context(|| format!("failed to load model {}", path.display()))
}

fn generics_json(env: &dyn TypeEnv, generics: &GenericsMap) -> Map<String, Value> {
    generics
        .iter()
        .map(|(name, ty)| {
            let rendered = TypeDisplay::new(env, ty).qualified().to_string();
            (name.clone(), Value::String(rendered))
        })
        .collect()
}

fn print_json(value: &Value) -> Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}
