use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

use crate::{BuildArgs, build::Builder, build::article::ARTICLE_EXT, config::Config};

pub fn run(args: &BuildArgs) -> Result<(), anyhow::Error> {
    let config_path = if args.config_file.is_relative() {
        std::env::current_dir()?.join(&args.config_file)
    } else {
        args.config_file.clone()
    };
    let config = Config::load(&config_path)?;

    // Arguments may name article files or bare stems
    let focus: HashSet<String> = args.articles.iter().map(|arg| focus_stem(arg)).collect();

    let started = Instant::now();
    let builder = Builder::new(config);
    let result = builder.build(&focus)?;

    println!(
        "Built {} pages to {} in {:.2}s",
        result.articles,
        result.output_dir.display(),
        started.elapsed().as_secs_f64()
    );

    Ok(())
}

/// Reduce an article argument to its stem: strip any directory part and the
/// article extension.
fn focus_stem(arg: &str) -> String {
    let name = Path::new(arg)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| arg.to_string());
    name.strip_suffix(ARTICLE_EXT).unwrap_or(&name).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_stem() {
        assert_eq!(focus_stem("intro"), "intro");
        assert_eq!(focus_stem("intro.art"), "intro");
        assert_eq!(focus_stem("input/intro.art"), "intro");
    }
}
