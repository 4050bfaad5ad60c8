use crate::{
    CleanArgs,
    build::{TOC_FILE_NAME, article::OUTPUT_EXT, is_generated_file},
    config::Config,
};

pub fn run(args: &CleanArgs) -> Result<(), anyhow::Error> {
    let config_path = if args.config_file.is_relative() {
        std::env::current_dir()?.join(&args.config_file)
    } else {
        args.config_file.clone()
    };
    let config = Config::load(&config_path)?;

    if !config.output_dir.exists() {
        return Ok(());
    }

    let mut deleted = 0;
    for entry in std::fs::read_dir(&config.output_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        let path = entry.path();
        // only pages generated by us and the TOC record list qualify
        let removable = name == TOC_FILE_NAME
            || (name.ends_with(OUTPUT_EXT) && is_generated_file(&path));
        if !removable {
            continue;
        }
        if args.dry_run {
            println!("Would delete {}", path.display());
        } else {
            std::fs::remove_file(&path)?;
            println!("Deleted {}", path.display());
        }
        deleted += 1;
    }

    println!(
        "{} {} files in {}",
        if args.dry_run { "Would delete" } else { "Deleted" },
        deleted,
        config.output_dir.display()
    );

    Ok(())
}
