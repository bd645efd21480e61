use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use grow_coach::api::HttpApi;
use grow_coach::api::traits::Attachment;
use grow_coach::config::CoachConfig;
use grow_coach::roadmap::model::Roadmap;
use grow_coach::roadmap::{Frequency, GenerationRequest, Level};
use grow_coach::session::{Session, SessionDeps, SessionEvent};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = CoachConfig::from_env();

    eprintln!("🌱 Grow coach v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", config.base_url);
    eprintln!("   Commands: /list, /new <goal>, /load <id>, /done <week> <mission>,");
    eprintln!("             /review <image path> [prompt], /back, /quit");
    eprintln!("   Anything else is sent to the coach.\n");

    let api = Arc::new(HttpApi::new(&config)?);
    let (session, mut events) = Session::new(&config, SessionDeps::from_backend(api));

    // Print background notifications: verification, commit results, the
    // auto-advance turn failing.
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::MissionVerified => {
                    eprintln!("\n✅ The coach verified your work — check the mission off with /done.");
                }
                SessionEvent::MissionCompleted { mission_id } => {
                    eprintln!("\n☑️  Mission {mission_id} completed.");
                }
                SessionEvent::CommitFailed { mission_id, reason } => {
                    eprintln!(
                        "\n⚠️  Mission {mission_id} is completed locally, but saving it \
                         to the server failed: {reason}"
                    );
                }
                SessionEvent::AutoAdvanceFailed { reason } => {
                    eprintln!("\n⚠️  Could not ask the coach about the next step: {reason}");
                }
            }
        }
    });

    print_roadmap_list(&session).await;

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();
    eprint!("> ");
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim().to_string();
        if line.is_empty() {
            eprint!("> ");
            continue;
        }
        match handle_line(&session, &line).await {
            Ok(true) => break,
            Ok(false) => {}
            Err(e) => eprintln!("⚠️  {e}"),
        }
        eprint!("> ");
    }

    Ok(())
}

/// Dispatch one REPL line. Returns `Ok(true)` to quit.
async fn handle_line(session: &Arc<Session>, line: &str) -> Result<bool> {
    match line.split_once(' ').map_or((line, ""), |(cmd, rest)| (cmd, rest.trim())) {
        ("/quit", _) => return Ok(true),
        ("/list", _) => print_roadmap_list(session).await,
        ("/new", goal) => {
            if goal.is_empty() {
                eprintln!("Usage: /new <learning goal>");
                return Ok(false);
            }
            eprintln!("Generating your roadmap, this can take a minute...");
            let request =
                GenerationRequest::new(goal, Level::Beginner, 4, Frequency::Daily);
            let roadmap = session.create(&request).await?;
            print_roadmap(&roadmap);
            print_last_reply(session).await;
        }
        ("/load", id) => {
            let id: i64 = id.parse().map_err(|_| anyhow::anyhow!("Usage: /load <id>"))?;
            let roadmap = session.load(id).await?;
            print_roadmap(&roadmap);
        }
        ("/done", rest) => {
            let mut parts = rest.split_whitespace();
            let (week, mission) = match (parts.next(), parts.next()) {
                (Some(w), Some(m)) => (w.parse::<usize>(), m.parse::<usize>()),
                _ => {
                    eprintln!("Usage: /done <week number> <mission number>");
                    return Ok(false);
                }
            };
            let (Ok(week), Ok(mission)) = (week, mission) else {
                eprintln!("Usage: /done <week number> <mission number>");
                return Ok(false);
            };
            if week == 0 || mission == 0 {
                eprintln!("Week and mission numbers start at 1");
                return Ok(false);
            }
            session.toggle_mission(week - 1, mission - 1).await?;
            if let Some(roadmap) = session.snapshot().await.roadmap {
                print_roadmap(&roadmap);
            }
        }
        ("/review", rest) => {
            let (path, prompt) = rest
                .split_once(' ')
                .map_or((rest, "Please review my work."), |(p, q)| (p, q));
            if path.is_empty() {
                eprintln!("Usage: /review <image path> [prompt]");
                return Ok(false);
            }
            let data = tokio::fs::read(path).await?;
            let attachment =
                Attachment::new(data, mime_for_path(path)).with_filename(path.to_string());
            let reply = session.send_turn(prompt, Some(attachment)).await?;
            println!("\n{}\n", reply.text);
            if reply.model_image.is_some() {
                eprintln!("(the coach attached an image)");
            }
        }
        ("/back", "confirm") => {
            let list = session.reset().await?;
            eprintln!("Session closed.");
            print_summaries(&list);
        }
        ("/back", _) => {
            eprintln!("This closes the current session. Type /back confirm to proceed.");
        }
        _ => {
            let reply = session.send_turn(line, None).await?;
            println!("\n{}\n", reply.text);
        }
    }
    Ok(false)
}

async fn print_roadmap_list(session: &Arc<Session>) {
    match session.list_roadmaps().await {
        Ok(list) if list.is_empty() => {
            eprintln!("No roadmaps yet. Start one with /new <goal>.");
        }
        Ok(list) => print_summaries(&list),
        Err(e) => eprintln!("⚠️  Could not load the roadmap list: {e}"),
    }
}

fn print_summaries(list: &[grow_coach::roadmap::RoadmapSummary]) {
    if list.is_empty() {
        eprintln!("No roadmaps yet. Start one with /new <goal>.");
        return;
    }
    eprintln!("Your roadmaps:");
    for item in list {
        eprintln!(
            "   #{} {} — {}/{} missions ({})",
            item.id,
            item.project_title,
            item.completed_missions,
            item.total_missions,
            item.created_at.format("%Y-%m-%d"),
        );
    }
}

fn print_roadmap(roadmap: &Roadmap) {
    eprintln!("\n📚 {}", roadmap.project_title);
    for week in &roadmap.curriculum {
        eprintln!("   Week {}: {}", week.week, week.theme);
        for mission in &week.missions {
            let mark = if mission.is_completed { "x" } else { " " };
            eprintln!("      [{mark}] {}", mission.title);
        }
    }
    let (completed, total) = roadmap.mission_counts();
    eprintln!("   Progress: {completed}/{total}\n");
}

async fn print_last_reply(session: &Arc<Session>) {
    if let Some(message) = session.snapshot().await.messages.last() {
        println!("\n{}\n", message.text);
    }
}

fn mime_for_path(path: &str) -> &'static str {
    match path.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
