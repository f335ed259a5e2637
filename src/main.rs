use clap::Parser;
use log::{error, info, warn};

use voc2retinanet::utils::create_progress_bar;
use voc2retinanet::{
    collect_xml_files, convert_xml_files, create_classes, format_args, read_config, read_model,
    run_trainer, write_annotations, Cli, Command, ModelFetcher, Result,
};

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Err(e) = run(cli.command) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Convert {
            inputs,
            output,
            append,
        } => {
            let xml_files = collect_xml_files(&inputs);
            if xml_files.is_empty() {
                warn!("No XML annotations found in {:?}", inputs);
                return Ok(());
            }
            info!("Converting {} annotation files...", xml_files.len());

            let pb = create_progress_bar(xml_files.len() as u64, "Convert");
            let rows = convert_xml_files(&xml_files, &pb);
            match &rows {
                Ok(_) => pb.finish_with_message("Conversion complete"),
                Err(_) => pb.abandon(),
            }
            let rows = rows?;

            write_annotations(&output, &rows, append)?;
            info!("Wrote {} annotations to {}", rows.len(), output.display());
        }
        Command::Classes { annotations } => {
            let classes_path = create_classes(&annotations)?;
            println!("{}", classes_path.display());
        }
        Command::TrainArgs {
            annotations,
            config_dir,
            trainer,
        } => {
            let config = read_config(&config_dir)?;
            let args = format_args(&annotations, &config)?;
            match trainer {
                Some(program) => run_trainer(&program, &args)?,
                None => {
                    for arg in &args {
                        println!("{}", arg);
                    }
                }
            }
        }
        Command::FetchModel {
            data_dir,
            url,
            backbone,
        } => {
            let fetcher = ModelFetcher::new(url, data_dir)?;
            let model_path = fetcher.use_release()?;
            if let Some(backbone) = backbone {
                read_model(&model_path, &backbone)?;
            }
            println!("{}", model_path.display());
        }
    }
    Ok(())
}
