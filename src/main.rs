use api::model::{PollId, UserId};
use api::watch::Watcher;
use api::{Client, Session};
use engine::timing;
use std::env;
use tokio::runtime::Runtime;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Parse environment variables
    let base_url = env::var("POLLCAST_API_URL")?;
    let token = env::var("POLLCAST_TOKEN")?;
    let user = env::var("POLLCAST_USER")?;
    let maybe_watch = env::var("POLLCAST_WATCH").ok();

    let session = Session::new(token, UserId::new(user));
    let client = Client::new(&base_url);

    let runtime = Runtime::new()?;
    runtime.block_on(async {
        let polls = client.list_visible_polls(&session, 1, 50).await?;
        log::info!("fetched {} visible polls", polls.len());

        let now = chrono::Utc::now();
        for poll in &polls {
            let state = timing::display(now, poll.start_time, poll.end_time);
            println!("{} [{}] {} - {}", poll.id, state.status, state.countdown, poll.title);
        }

        let Some(target) = maybe_watch else {
            return Ok(());
        };
        let target = PollId::new(target);
        let view = client.get_poll(&session, &target).await?;
        log::info!("watching poll {target} until it completes");

        let watcher = Watcher::default();
        let Some(mut updates) = watcher.watch(&view.poll) else {
            anyhow::bail!("poll {target} is already being watched");
        };
        while let Some(state) = updates.recv().await {
            println!("{target}: {} ({} urgency, {})", state.countdown, state.urgency, state.status);
        }
        anyhow::Ok(())
    })?;
    Ok(())
}
