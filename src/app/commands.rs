//! `pgqctl` subcommand execution

use crate::app::cli::args::Command;
use crate::app::cli::display::{batch_info_table, consumer_table, queue_table, Output};
use crate::app::error::AppError;
use crate::core::styles::StyleRole;
use crate::core::validation::ValidationError;
use crate::core::version::long_version;
use crate::queue::{PgqClient, PollPolicy};
use serde_json::json;

/// Run one subcommand against the client and print its result
pub async fn run(command: &Command, client: &PgqClient, output: Output) -> Result<(), AppError> {
    log::debug!("Running {}", command.name());

    match command {
        Command::Version => {
            let server = client.admin().version().await?;
            if output.json {
                output.print_json(&json!({ "client": long_version(), "pgq": server }))?;
            } else {
                output.status(StyleRole::Key, &format!("pgqctl {}", long_version()));
                output.status(StyleRole::Value, &format!("pgq {}", server));
            }
        }

        Command::CreateQueue { queue } => {
            let created = client.admin().create_queue(queue).await?;
            if output.json {
                output.print_json(&json!({ "queue": queue, "created": created }))?;
            } else if created {
                output.status(StyleRole::Success, &format!("Created queue '{}'", queue));
            } else {
                output.status(StyleRole::Warning, &format!("Queue '{}' already exists", queue));
            }
        }

        Command::DropQueue { queue, force } => {
            client.admin().drop_queue(queue, *force).await?;
            if output.json {
                output.print_json(&json!({ "queue": queue, "dropped": true }))?;
            } else {
                output.status(StyleRole::Success, &format!("Dropped queue '{}'", queue));
            }
        }

        Command::SetConfig { queue, key, value } => {
            client.admin().set_queue_config(queue, key, value).await?;
            if output.json {
                output.print_json(&json!({ "queue": queue, "key": key, "value": value }))?;
            } else {
                output.status(
                    StyleRole::Success,
                    &format!("Set {} = {} on '{}'", key, value, queue),
                );
            }
        }

        Command::Queues { queue } => {
            let queues = match queue {
                Some(name) => {
                    let info = client.admin().queue_info(name).await?;
                    vec![info.ok_or_else(|| AppError::NotFound(format!("Queue '{}' not found", name)))?]
                }
                None => client.admin().all_queue_info().await?,
            };
            if output.json {
                output.print_json(&queues)?;
            } else if queues.is_empty() {
                output.status(StyleRole::Dim, "No queues");
            } else {
                queue_table(&queues, output.color).printstd();
            }
        }

        Command::Consumers { queue, consumer } => {
            let consumers = client
                .admin()
                .get_consumer_info(queue.as_deref(), consumer.as_deref())
                .await?;
            if output.json {
                output.print_json(&consumers)?;
            } else if consumers.is_empty() {
                output.status(StyleRole::Dim, "No consumers");
            } else {
                consumer_table(&consumers, output.color).printstd();
            }
        }

        Command::CurrentTable { queue } => {
            let table = client.admin().current_event_table(queue).await?;
            if output.json {
                output.print_json(&json!({ "queue": queue, "table": table }))?;
            } else {
                output.status(StyleRole::Value, &table);
            }
        }

        Command::Insert {
            queue,
            ev_type,
            data,
            extra,
        } => {
            let extra: Option<Vec<Option<String>>> = if extra.is_empty() {
                None
            } else {
                Some(extra.iter().cloned().map(Some).collect())
            };
            let ev_id = client
                .producer()
                .insert_event(queue, ev_type, data, extra.as_deref())
                .await?;
            if output.json {
                output.print_json(&json!({ "queue": queue, "ev_id": ev_id }))?;
            } else {
                output.status(
                    StyleRole::Success,
                    &format!("Inserted event {} into '{}'", ev_id, queue),
                );
            }
        }

        Command::Register {
            queue,
            consumer,
            at,
        } => {
            let handle = client.consumer(queue, consumer);
            let registered = match at {
                Some(tick_id) => handle.register_at(*tick_id).await?,
                None => handle.register().await?,
            };
            if output.json {
                output.print_json(
                    &json!({ "queue": queue, "consumer": consumer, "registered": registered }),
                )?;
            } else if registered {
                output.status(
                    StyleRole::Success,
                    &format!("Registered '{}' on '{}'", consumer, queue),
                );
            } else {
                output.status(
                    StyleRole::Warning,
                    &format!("'{}' is already registered on '{}'", consumer, queue),
                );
            }
        }

        Command::Unregister { queue, consumer } => {
            let removed = client.consumer(queue, consumer).unregister().await?;
            if output.json {
                output.print_json(
                    &json!({ "queue": queue, "consumer": consumer, "unregistered": removed }),
                )?;
            } else if removed {
                output.status(
                    StyleRole::Success,
                    &format!("Unregistered '{}' from '{}'", consumer, queue),
                );
            } else {
                output.status(
                    StyleRole::Warning,
                    &format!("'{}' was not registered on '{}'", consumer, queue),
                );
            }
        }

        Command::BatchInfo { batch_id } => {
            let info = client
                .admin()
                .get_batch_info(*batch_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Batch {} not found", batch_id)))?;
            if output.json {
                output.print_json(&info)?;
            } else {
                batch_info_table(*batch_id, &info, output.color).printstd();
            }
        }

        Command::Tick { queue, tick_id } => {
            let created = client.ticker().ticker(queue, *tick_id).await?;
            if output.json {
                output.print_json(&json!({ "queue": queue, "tick_id": created }))?;
            } else {
                match created {
                    Some(id) => output.status(StyleRole::Success, &format!("Tick {}", id)),
                    None => output.status(StyleRole::Dim, "No tick due"),
                }
            }
        }

        Command::ForceTick {
            queue,
            wait,
            attempts,
            delay,
        } => {
            let tick_id = if *wait {
                let delay = delay
                    .to_std()
                    .ok_or_else(|| ValidationError::new("--delay must not be negative"))?;
                let policy = PollPolicy {
                    max_attempts: *attempts,
                    delay,
                };
                client.ticker().force_tick_and_wait(queue, policy).await?
            } else {
                Some(client.ticker().force_tick(queue).await?)
            };
            if output.json {
                output.print_json(&json!({ "queue": queue, "tick_id": tick_id }))?;
            } else {
                match tick_id {
                    Some(id) => output.status(StyleRole::Success, &format!("Tick {}", id)),
                    None => output.status(StyleRole::Warning, "Tick did not advance"),
                }
            }
        }
    }

    Ok(())
}
