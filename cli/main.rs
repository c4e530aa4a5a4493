#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]

use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use heartscore::context::FitContext;
use heartscore::data::LoaderOptions;
use heartscore::estimate::FitSummary;
use heartscore::input::RawRecord;
use heartscore::model::PredictionError;
use heartscore::schema::Feature;

#[derive(Parser)]
#[command(
    name = "heartscore",
    version,
    about = "Fit a linear heart-disease risk model and score new individuals",
    long_about = "Fits a linear model to a table of clinical records with the closed-form \
                 normal equation and applies it to one person's measurements to produce a \
                 risk percentage and a recommendation."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the model and print its coefficients
    Fit {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Fit the model, then score one individual
    Assess {
        #[command(flatten)]
        source: SourceArgs,

        /// TOML file holding the individual's fields; flags override its values
        #[arg(long, value_name = "FILE")]
        record: Option<PathBuf>,

        #[command(flatten)]
        fields: FieldArgs,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Path to the training table with age,sex,cp,...,thal,target columns
    data: PathBuf,

    /// Column separator of the training table (a single character, or `\t`)
    #[arg(long, default_value = ",", value_parser = parse_separator)]
    separator: u8,
}

#[derive(Args)]
struct FieldArgs {
    /// Name shown with the result
    #[arg(long)]
    name: Option<String>,
    /// Age in years (0-120)
    #[arg(long)]
    age: Option<String>,
    /// male or female
    #[arg(long)]
    gender: Option<String>,
    /// Chest pain type (0-3)
    #[arg(long = "cp")]
    chest_pain_type: Option<String>,
    /// Resting blood pressure (50-200)
    #[arg(long = "trestbps")]
    resting_bp: Option<String>,
    /// Serum cholesterol (100-600)
    #[arg(long = "chol")]
    cholesterol: Option<String>,
    /// Fasting blood sugar flag (true/false)
    #[arg(long = "fbs")]
    fasting_blood_sugar: Option<String>,
    /// Resting electrocardiographic result (0/1)
    #[arg(long = "restecg")]
    resting_ecg: Option<String>,
    /// Maximum heart rate achieved (50-220)
    #[arg(long = "thalach")]
    max_heart_rate: Option<String>,
    /// Exercise induced angina (true/false)
    #[arg(long = "exang")]
    exercise_angina: Option<String>,
    /// ST depression induced by exercise (0.0-4.0)
    #[arg(long = "oldpeak")]
    st_depression: Option<String>,
    /// Slope of the peak exercise ST segment (0-3)
    #[arg(long)]
    slope: Option<String>,
    /// Number of major vessels (0/1/2)
    #[arg(long = "ca")]
    vessel_count: Option<String>,
    /// Thalassemia (1-3)
    #[arg(long = "thal")]
    thalassemia: Option<String>,
}

impl FieldArgs {
    fn into_raw_record(self) -> RawRecord {
        let pairs = [
            (Feature::Age, self.age),
            (Feature::Sex, self.gender),
            (Feature::ChestPainType, self.chest_pain_type),
            (Feature::RestingBloodPressure, self.resting_bp),
            (Feature::Cholesterol, self.cholesterol),
            (Feature::FastingBloodSugar, self.fasting_blood_sugar),
            (Feature::RestingEcg, self.resting_ecg),
            (Feature::MaxHeartRate, self.max_heart_rate),
            (Feature::ExerciseAngina, self.exercise_angina),
            (Feature::StDepression, self.st_depression),
            (Feature::Slope, self.slope),
            (Feature::VesselCount, self.vessel_count),
            (Feature::Thalassemia, self.thalassemia),
        ];
        let mut record = RawRecord::new();
        record.name = self.name;
        for (feature, value) in pairs {
            if let Some(value) = value {
                record = record.with(feature, value);
            }
        }
        record
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Fit { source } => fit_command(&source),
        Commands::Assess {
            source,
            record,
            fields,
        } => assess_command(&source, record.as_deref(), fields),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn fit_command(source: &SourceArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (context, summary) = load_and_fit(source)?;
    print_summary(&context, &summary);
    Ok(())
}

fn assess_command(
    source: &SourceArgs,
    record_path: Option<&Path>,
    fields: FieldArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut record = match record_path {
        Some(path) => {
            log::info!("Reading record from '{}'", path.display());
            toml::from_str::<RawRecord>(&fs::read_to_string(path)?)?
        }
        None => RawRecord::new(),
    };
    record.merge_from(fields.into_raw_record());
    if record.name.is_none() {
        return Err(PredictionError::InvalidField {
            field: "name",
            reason: "is required".to_string(),
        }
        .into());
    }

    let (context, summary) = load_and_fit(source)?;
    print_summary(&context, &summary);

    let assessment = context.predict(&record)?;
    println!();
    println!("{assessment}");
    Ok(())
}

fn load_and_fit(source: &SourceArgs) -> Result<(FitContext, FitSummary), Box<dyn std::error::Error>> {
    let mut context = FitContext::with_loader_options(LoaderOptions {
        separator: source.separator,
    });
    let dataset = context.load_dataset(&source.data)?;
    println!(
        "Loaded {} records ({} dropped for missing values)",
        dataset.len(),
        dataset.dropped_rows()
    );
    let summary = context.fit_model()?;
    Ok((context, summary))
}

fn print_summary(context: &FitContext, summary: &FitSummary) {
    println!(
        "Linear regression model trained on {} records using the normal equation.",
        summary.num_records
    );
    if let Some(model) = context.model() {
        for (i, (name, weight)) in model.named_coefficients().into_iter().enumerate() {
            println!("Coefficient for feature {i} ({name}): {weight:.4}");
        }
    }
    println!(
        "Residual sum of squares: {:.6}",
        summary.residual_sum_of_squares
    );
}

fn parse_separator(value: &str) -> Result<u8, String> {
    match value {
        "\\t" | "tab" => Ok(b'\t'),
        _ => {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() => Ok(c as u8),
                _ => Err(format!(
                    "separator must be a single ASCII character or '\\t', got '{value}'"
                )),
            }
        }
    }
}
