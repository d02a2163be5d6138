mod demo;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use demo::{DemoClient, FunctionUrls, PatientForm, PatientSummary};
use ehr_core::config::required_setting;
use ehr_core::{AppointmentQuery, CoreConfig, EhrService, RowFilter};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ehr")]
#[command(about = "EHR demo CLI: page queries against the FHIR API and calls to the demo functions")]
struct Cli {
    #[command(flatten)]
    settings: Settings,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct Settings {
    /// FHIR API base URL
    #[arg(long, env = "EHR_FHIR_URL", global = true)]
    fhir_url: Option<String>,
    /// Platform API base URL (user lookup)
    #[arg(long, env = "EHR_PLATFORM_URL", global = true)]
    platform_url: Option<String>,
    /// Organisation long name, used in page titles
    #[arg(long, env = "EHR_ORGANIZATION_NAME_LONG", global = true)]
    organization_name: Option<String>,
    /// Domain hosting the consent documents
    #[arg(long, env = "EHR_ORGANIZATION_CONSENTS_DOMAIN", global = true)]
    consents_domain: Option<String>,
    /// Bearer token forwarded to the FHIR API
    #[arg(long, env = "EHR_ACCESS_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,
    /// Base URL the local host serves the functions under (`{base}/{name}`)
    #[arg(long, env = "EHR_FUNCTIONS_URL", global = true)]
    functions_url: Option<String>,
    /// URL of the deployed create-patient function
    #[arg(long, env = "EHR_CREATE_PATIENT_URL", global = true)]
    create_patient_url: Option<String>,
    /// URL of the deployed get-patients function
    #[arg(long, env = "EHR_GET_PATIENTS_URL", global = true)]
    get_patients_url: Option<String>,
    /// Project id sent with every function call
    #[arg(long, env = "EHR_PROJECT_ID", global = true, default_value = "")]
    project_id: String,
    /// App environment; anything other than `local` unwraps function results from `output`
    #[arg(long, env = "EHR_APP_ENV", global = true, default_value = "local")]
    app_env: String,
}

impl Settings {
    fn service(&self) -> anyhow::Result<EhrService> {
        let config = CoreConfig::new(
            &required_setting("EHR_FHIR_URL", self.fhir_url.clone())?,
            &required_setting("EHR_PLATFORM_URL", self.platform_url.clone())?,
            &required_setting("EHR_ORGANIZATION_NAME_LONG", self.organization_name.clone())?,
            &required_setting(
                "EHR_ORGANIZATION_CONSENTS_DOMAIN",
                self.consents_domain.clone(),
            )?,
            None,
        )?;
        Ok(EhrService::new(config)?)
    }

    fn token(&self) -> anyhow::Result<String> {
        Ok(required_setting("EHR_ACCESS_TOKEN", self.token.clone())?)
    }

    fn demo_client(&self) -> anyhow::Result<DemoClient> {
        let urls = FunctionUrls::resolve(
            self.functions_url.as_deref(),
            self.create_patient_url.clone(),
            self.get_patients_url.clone(),
        )?;
        Ok(DemoClient::new(urls, &self.project_id, &self.app_env)?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print an EHR page as JSON
    Pages {
        #[command(subcommand)]
        page: Page,
    },
    /// Cancel an appointment and free its slot
    Cancel {
        /// Appointment id
        id: String,
    },
    /// Show the signed-in user
    User,
    /// Create a patient through the create-patient function, then list patients
    CreatePatient {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        date_of_birth: Option<NaiveDate>,
        #[arg(long)]
        address: Option<String>,
    },
    /// List patients through the get-patients function
    GetPatients,
}

#[derive(Args)]
struct FilterArgs {
    /// Patient name contains (case-insensitive)
    #[arg(long)]
    name: Option<String>,
    /// Appointment start date (YYYY-MM-DD)
    #[arg(long)]
    date: Option<NaiveDate>,
}

impl From<FilterArgs> for RowFilter {
    fn from(args: FilterArgs) -> Self {
        RowFilter {
            name: args.name,
            date: args.date,
        }
    }
}

#[derive(Subcommand)]
enum Page {
    /// Upcoming appointments
    Appointments {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Appointments by date range and status
    Search {
        /// Lower bound on the appointment start (ISO 8601)
        #[arg(long)]
        start: Option<String>,
        /// Upper bound on the appointment start (ISO 8601)
        #[arg(long)]
        end: Option<String>,
        /// Comma-separated statuses
        #[arg(long)]
        status: Option<String>,
        /// Patient name contains (case-insensitive)
        #[arg(long)]
        name: Option<String>,
    },
    /// Appointment detail
    Appointment { id: String },
    /// Patient list
    Patients {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Patient detail
    Patient { id: String },
    /// Patient insurance
    Insurance { id: String },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_patients(patients: &[PatientSummary]) {
    if patients.is_empty() {
        println!("No patients found.");
        return;
    }
    for p in patients {
        println!(
            "ID: {}, Patient: {}, Date of Birth: {}, Address: {}",
            p.id.as_deref().unwrap_or("-"),
            p.name.as_deref().unwrap_or("-"),
            p.date_of_birth.as_deref().unwrap_or("-"),
            p.address.as_deref().unwrap_or("-"),
        );
    }
}

async fn show_page(settings: &Settings, page: Page) -> anyhow::Result<()> {
    let service = settings.service()?;
    let token = settings.token()?;
    match page {
        Page::Appointments { filter } => {
            print_json(&service.upcoming_appointments(&token, &filter.into()).await?)
        }
        Page::Search {
            start,
            end,
            status,
            name,
        } => {
            let query = AppointmentQuery { start, end, status };
            let filter = RowFilter { name, date: None };
            print_json(&service.search_appointments(&token, &query, &filter).await?)
        }
        Page::Appointment { id } => print_json(&service.appointment(&token, &id).await?),
        Page::Patients { filter } => print_json(&service.patients(&token, &filter.into()).await?),
        Page::Patient { id } => print_json(&service.patient(&token, &id).await?),
        Page::Insurance { id } => print_json(&service.insurance(&token, &id).await?),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ehr=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = &cli.settings;

    match cli.command {
        Some(Commands::Pages { page }) => show_page(settings, page).await?,
        Some(Commands::Cancel { id }) => {
            let outcome = settings
                .service()?
                .cancel_appointment(&settings.token()?, &id)
                .await?;
            print_json(&outcome)?;
        }
        Some(Commands::User) => {
            let user = settings
                .service()?
                .current_user(&settings.token()?)
                .await?;
            print_json(&user)?;
        }
        Some(Commands::CreatePatient {
            first_name,
            last_name,
            date_of_birth,
            address,
        }) => {
            let form = PatientForm {
                first_name,
                last_name,
                date_of_birth,
                address,
            };
            let mut client = settings.demo_client()?;
            let result = client.add_patient(&form).await;
            for line in client.logs() {
                println!("{}", line);
            }
            match result {
                Ok(patients) => print_patients(&patients),
                Err(e) => eprintln!("{}", e),
            }
        }
        Some(Commands::GetPatients) => {
            let mut client = settings.demo_client()?;
            let result = client.search_patients().await;
            for line in client.logs() {
                println!("{}", line);
            }
            match result {
                Ok(patients) => print_patients(&patients),
                Err(e) => eprintln!("{}", e),
            }
        }
        None => {
            println!("Use 'ehr --help' for commands");
        }
    }

    Ok(())
}
