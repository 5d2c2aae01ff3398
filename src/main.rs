use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::{TimeZone, Utc};
use clap::Parser;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

use permit_tracker::cli::{Cli, Command, WorkerCommand};
use permit_tracker::config::TrackerConfig;
use permit_tracker::export::{self, ExportAdapter, JsonExporter, SheetRow};
use permit_tracker::store::{JsonFileStore, MemoryStore, RecordStore};
use permit_tracker::ui::Printer;
use permit_tracker::workflow::{
    Action, ActionRequest, Role, RoleEmails, TimeWindow, WorkerAction, WorkerProfile,
};
use permit_tracker::{NewPermit, PermitService};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = TrackerConfig::load()?;
    if let Some(store) = cli.store {
        config.store_path = store;
    }

    let svc = service(JsonFileStore::open(&config.store_path), &config);
    run(cli.command, &svc, &config).await
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn service<S: RecordStore>(store: S, config: &TrackerConfig) -> PermitService<S> {
    PermitService::with_settings(
        store,
        config.limits(),
        config.retry(),
        config.permit_id_offset,
    )
}

async fn run<S: RecordStore>(
    command: Command,
    svc: &PermitService<S>,
    config: &TrackerConfig,
) -> Result<()> {
    let printer = Printer::default();

    match command {
        Command::Create {
            from,
            to,
            requester,
            reviewer,
            approver,
        } => {
            let permit = svc
                .create_permit(NewPermit {
                    validity_window: TimeWindow::new(from, to),
                    role_emails: RoleEmails {
                        requester,
                        reviewer,
                        approver,
                    },
                })
                .await?;
            printer.permit(&permit);
        }
        Command::Act {
            permit_id,
            role,
            action,
            actor,
            payload,
        } => {
            let payload = parse_payload(payload.as_deref())?;
            let request =
                ActionRequest::new(permit_id, role.into(), actor.name, actor.email, action.into())
                    .with_payload(payload);
            submit(svc, &printer, &request).await;
        }
        Command::Renew {
            permit_id,
            actor,
            from,
            to,
            hydrocarbon,
            toxic,
            oxygen,
        } => {
            let request = ActionRequest::new(
                permit_id,
                Role::Requester,
                actor.name,
                actor.email,
                Action::ProposeRenewal,
            )
            .with_payload(json!({
                "from": from,
                "to": to,
                "readings": {"hydrocarbon": hydrocarbon, "toxic": toxic, "oxygen": oxygen},
            }));
            submit(svc, &printer, &request).await;
        }
        Command::Show { permit_id } => {
            printer.permit(&svc.get_permit(&permit_id).await?);
        }
        Command::List => {
            let permits = svc.list_permits().await?;
            let rows: Vec<SheetRow> = permits.iter().map(SheetRow::from).collect();
            printer.sheet(&rows);
        }
        Command::Export { permit_id, out } => {
            let mut writer: Box<dyn Write> = match &out {
                Some(path) => Box::new(
                    std::fs::File::create(path)
                        .with_context(|| format!("failed to create {}", path.display()))?,
                ),
                None => Box::new(std::io::stdout()),
            };
            let exporter = JsonExporter;
            match permit_id {
                Some(id) => {
                    let permit = svc.get_permit(&id).await?;
                    exporter.export_permit(&export::snapshot(&permit), &mut writer)?;
                }
                None => {
                    let permits = svc.list_permits().await?;
                    let rows: Vec<SheetRow> = permits.iter().map(SheetRow::from).collect();
                    exporter.export_sheet(&rows, &mut writer)?;
                }
            }
        }
        Command::Worker(WorkerCommand::Register {
            name,
            company,
            trade,
            id_number,
        }) => {
            let worker = svc
                .register_worker(WorkerProfile {
                    name,
                    company,
                    trade,
                    id_number,
                    certificate_expiry: None,
                })
                .await?;
            printer.worker(&worker);
        }
        Command::Worker(WorkerCommand::Propose {
            worker_id,
            by,
            name,
            company,
            trade,
            id_number,
        }) => {
            let action = WorkerAction::Propose {
                profile: WorkerProfile {
                    name,
                    company,
                    trade,
                    id_number,
                    certificate_expiry: None,
                },
            };
            let worker = svc
                .act_on_worker(&worker_id, Role::Requester, &by, &action)
                .await?;
            printer.worker(&worker);
        }
        Command::Worker(WorkerCommand::Act {
            worker_id,
            role,
            name,
            reject,
        }) => {
            let action = match reject {
                Some(reason) => WorkerAction::Reject { reason },
                None => WorkerAction::Approve,
            };
            let worker = svc
                .act_on_worker(&worker_id, role.into(), &name, &action)
                .await?;
            printer.worker(&worker);
        }
        Command::Worker(WorkerCommand::Show { worker_id }) => {
            printer.worker(&svc.get_worker(&worker_id).await?);
        }
        Command::Demo => {
            let demo_svc = service(MemoryStore::new(), config);
            demo(&demo_svc, &printer).await?;
        }
    }
    Ok(())
}

fn parse_payload(raw: Option<&str>) -> Result<Value> {
    let Some(raw) = raw else {
        return Ok(json!({}));
    };
    let value: Value = serde_json::from_str(raw).context("--payload must be valid JSON")?;
    if !value.is_object() {
        bail!("--payload must be a JSON object");
    }
    Ok(value)
}

async fn submit<S: RecordStore>(svc: &PermitService<S>, printer: &Printer, request: &ActionRequest) {
    let response = svc.respond(request).await;
    let label = format!("{} {} {}", request.role, request.action, request.permit_id);
    printer.response(&label, &response);
    if !response.success {
        std::process::exit(1);
    }
}

/// Walks one permit from creation to closure, including a rejected and a
/// re-proposed renewal.
async fn demo<S: RecordStore>(svc: &PermitService<S>, printer: &Printer) -> Result<()> {
    let t = |d, h, m| Utc.with_ymd_and_hms(2024, 1, d, h, m, 0).single();
    let (Some(from), Some(to)) = (t(1, 8, 0), t(3, 8, 0)) else {
        bail!("invalid demo window");
    };

    let permit = svc
        .create_permit(NewPermit {
            validity_window: TimeWindow::new(from, to),
            role_emails: RoleEmails {
                requester: "sam@site.example".into(),
                reviewer: "dana@site.example".into(),
                approver: "ade@site.example".into(),
            },
        })
        .await?;
    let id = permit.id.clone();

    let step = |role: Role, action: Action, payload: Value| {
        let (name, email) = match role {
            Role::Requester => ("Sam Requester", "sam@site.example"),
            Role::Reviewer => ("Dana Reviewer", "dana@site.example"),
            Role::Approver => ("Ade Approver", "ade@site.example"),
        };
        ActionRequest::new(id.clone(), role, name, email, action).with_payload(payload)
    };

    let script = [
        step(
            Role::Requester,
            Action::Submit,
            json!({"work_type": "hot_work", "location": "Tank farm, bund 3", "ppe": ["FR coveralls", "face shield"]}),
        ),
        step(Role::Reviewer, Action::Review, json!({"remarks": "gas test clear"})),
        step(Role::Approver, Action::Approve, json!({})),
        step(
            Role::Requester,
            Action::ProposeRenewal,
            json!({"from": "2024-01-01T09:00:00Z", "to": "2024-01-01T16:00:00Z"}),
        ),
        step(Role::Reviewer, Action::Reject, json!({"reason": "insufficient gas readings"})),
        step(
            Role::Requester,
            Action::ProposeRenewal,
            json!({"from": "2024-01-01T09:30:00Z", "to": "2024-01-01T16:00:00Z",
                   "readings": {"hydrocarbon": "0% LEL", "toxic": "0 ppm H2S", "oxygen": "20.9%"}}),
        ),
        step(Role::Reviewer, Action::Approve, json!({})),
        step(Role::Approver, Action::Approve, json!({})),
        step(Role::Requester, Action::InitiateClosure, json!({"site_restored": true})),
        step(Role::Reviewer, Action::ApproveClosure, json!({})),
        step(Role::Approver, Action::Approve, json!({"remarks": "work complete"})),
        step(Role::Requester, Action::Submit, json!({})),
    ];

    for request in &script {
        let response = svc.respond(request).await;
        let label = format!("{} {}", request.role, request.action);
        printer.response(&label, &response);
    }

    println!();
    printer.permit(&svc.get_permit(&id).await?);
    Ok(())
}
