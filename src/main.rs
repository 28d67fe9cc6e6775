use quickrecord::engine::{QuickOutcome, spawn_reconciler};
use quickrecord::{
    ApiClient, AppError, Config, CounterCache, Engine, RefClock, ReportFilter, ReportView,
    rollover, ui,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    let clock = RefClock::new(config.utc_offset_hours)
        .ok_or_else(|| format!("invalid UTC offset: {}", config.utc_offset_hours))?;
    let api = ApiClient::new(&config.api_url)?;
    let cache = CounterCache::load(config.cache_path.clone()).await;

    let (engine, events) = Engine::new(api.clone(), clock, cache, config.resync_delay);

    engine.purge_stale().await;
    match engine.refresh_persons().await {
        Ok(names) => info!("tracking {} persons via {}", names.len(), config.api_url),
        Err(err) => warn!("could not load persons: {err}"),
    }

    let reconciler = spawn_reconciler(engine.clone(), events);
    let midnight = rollover::spawn(engine.clone());

    print_board(&engine).await;
    run_repl(&engine, &api, &config).await?;

    midnight.abort();
    reconciler.abort();
    Ok(())
}

async fn run_repl(engine: &Engine, api: &ApiClient, config: &Config) -> Result<(), std::io::Error> {
    let mut report: Option<ReportView> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("type 'help' for commands");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !dispatch(engine, api, config, &mut report, line.trim()).await {
                    break;
                }
            }
        }
    }
    Ok(())
}

async fn dispatch(
    engine: &Engine,
    api: &ApiClient,
    config: &Config,
    report: &mut Option<ReportView>,
    line: &str,
) -> bool {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return true;
    };
    let rest: Vec<&str> = words.collect();

    match command {
        "quit" | "exit" => return false,
        "help" => print_help(),
        "list" => {
            match engine.refresh_persons().await {
                Ok(_) => print_board(engine).await,
                Err(err) => println!("error: {err}"),
            }
        }
        "sync" => {
            engine.resync_all().await;
            print_board(engine).await;
        }
        "+" | "-" => {
            let Some(person) = join_name(&rest) else {
                println!("usage: {command} <person>");
                return true;
            };
            let outcome = if command == "+" {
                engine.increment(&person).await
            } else {
                engine.decrement(&person).await
            };
            print_outcome(&outcome);
        }
        "report" => match build_filter(&rest) {
            Ok(filter) => {
                let mut view = ReportView::new(api.clone(), filter, config.page_size);
                match view.refresh().await {
                    Ok(()) => {
                        print!("{}", ui::render_report(&view));
                        *report = Some(view);
                    }
                    Err(err) => println!("error: {err}"),
                }
            }
            Err(err) => println!("error: {err}"),
        },
        "page" | "next" | "prev" | "size" => {
            let Some(view) = report.as_mut() else {
                println!("run 'report' first");
                return true;
            };
            let moved = match command {
                "page" => match rest.first().and_then(|value| value.parse().ok()) {
                    Some(page) => view.set_page(page).await,
                    None => {
                        println!("usage: page <n>");
                        return true;
                    }
                },
                "next" => view.next_page().await,
                "prev" => view.prev_page().await,
                _ => match rest.first().and_then(|value| value.parse().ok()) {
                    Some(size) => view.set_page_size(size).await.map(|_| true),
                    None => {
                        println!("usage: size <n>");
                        return true;
                    }
                },
            };
            match moved {
                Ok(true) => print!("{}", ui::render_report(view)),
                Ok(false) => println!("no such page"),
                Err(err) => println!("error: {err}"),
            }
        }
        "del" => {
            let Some(view) = report.as_mut() else {
                println!("run 'report' first");
                return true;
            };
            let Some(id) = rest.first().and_then(|value| value.parse().ok()) else {
                println!("usage: del <record-id>");
                return true;
            };
            match view.delete_record(id).await {
                Ok(person) => {
                    if let Some(person) = person {
                        engine.record_removed(&person);
                    }
                    println!("record {id} deleted");
                    print!("{}", ui::render_report(view));
                }
                Err(err) => println!("error: {err}"),
            }
        }
        "person" => handle_person(engine, api, &rest).await,
        other => println!("unknown command: {other} (try 'help')"),
    }
    true
}

async fn handle_person(engine: &Engine, api: &ApiClient, rest: &[&str]) {
    let result = match rest {
        ["add", name @ ..] if !name.is_empty() => {
            api.create_person(&name.join(" ")).await.map(|person| {
                println!("added {} (id {})", person.name, person.id);
            })
        }
        ["rename", id, name @ ..] if !name.is_empty() => match id.parse() {
            Ok(id) => api.rename_person(id, &name.join(" ")).await.map(|person| {
                println!("renamed to {}", person.name);
            }),
            Err(_) => {
                println!("usage: person rename <id> <name>");
                return;
            }
        },
        ["del", id] => match id.parse() {
            Ok(id) => api.delete_person(id).await.map(|()| {
                println!("person {id} deleted");
            }),
            Err(_) => {
                println!("usage: person del <id>");
                return;
            }
        },
        _ => {
            println!("usage: person add <name> | person rename <id> <name> | person del <id>");
            return;
        }
    };

    match result {
        Ok(()) => {
            // Board membership changed; re-read the person list.
            if let Err(err) = engine.refresh_persons().await {
                warn!("could not reload persons: {err}");
            }
            print_board(engine).await;
        }
        // 400 details (duplicate name, person still has records, ...) are
        // the server's words, shown as-is.
        Err(AppError::Api { detail, .. }) => println!("error: {detail}"),
        Err(err) => println!("error: {err}"),
    }
}

fn build_filter(rest: &[&str]) -> Result<ReportFilter, AppError> {
    let mut filter = ReportFilter::default();
    for part in rest {
        match part.split_once('=') {
            Some(("person", value)) => filter.person = Some(value.to_string()),
            Some(("from", value)) => {
                filter.date_gte = Some(value.parse().map_err(|_| {
                    AppError::InvalidInput(format!("bad date: {value}"))
                })?);
            }
            Some(("to", value)) => {
                filter.date_lte = Some(value.parse().map_err(|_| {
                    AppError::InvalidInput(format!("bad date: {value}"))
                })?);
            }
            _ => {
                return Err(AppError::InvalidInput(format!(
                    "unknown filter: {part} (use person=, from=, to=)"
                )));
            }
        }
    }
    Ok(filter)
}

fn join_name(rest: &[&str]) -> Option<String> {
    if rest.is_empty() {
        None
    } else {
        Some(rest.join(" "))
    }
}

async fn print_board(engine: &Engine) {
    let snapshot = engine.board_snapshot().await;
    print!("{}", ui::render_board(engine.clock().today(), &snapshot));
}

fn print_outcome(outcome: &QuickOutcome) {
    match outcome {
        QuickOutcome::AtFloor => println!("already at zero"),
        QuickOutcome::Added { person, count } => println!("{person}: {count}"),
        QuickOutcome::Deleted { person, count } => println!("{person}: {count}"),
        QuickOutcome::NothingToDelete { person, count } => {
            println!("{person} has no records today; counter stays at {count}")
        }
        QuickOutcome::Failed { person, count, detail } => {
            println!("{person}: {detail} (counter restored to {count})")
        }
    }
}

fn print_help() {
    println!(
        "\
commands:
  list                         reload persons and today's counters
  + <person> / - <person>      quick increment / decrement
  sync                         resync all counters from the server
  report [person=N] [from=D] [to=D]
  page <n> | next | prev | size <n>
  del <record-id>              delete a record from the open report
  person add <name> | person rename <id> <name> | person del <id>
  quit"
    );
}
