//! Background fetching.
//!
//! The UI thread never awaits the network.  When the feed controller (or
//! the detail view) needs data, [`Dispatcher`] spawns a tokio task that runs
//! the request against the [`Catalog`] and sends the result back over an
//! unbounded channel as a [`FetchMsg`].  The main loop drains that channel
//! on every tick.
//!
//! ## For contributors
//!
//! Messages carry the generation they were issued under; it is the
//! receiver's job to ignore results that no longer match.  Nothing here is
//! ever cancelled.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::catalog::Catalog;
use crate::error::FetchError;
use crate::feed::{FetchOutcome, FetchPlan};
use crate::source::ArtworkDetail;

/// Messages sent from fetch tasks to the UI thread.
#[derive(Debug)]
pub enum FetchMsg {
    /// A feed plan finished (every target joined).
    Feed(FetchOutcome),
    /// A detail lookup finished.
    Detail {
        generation: u64,
        result: Result<ArtworkDetail, FetchError>,
    },
}

/// Work queued by the application for the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Feed(FetchPlan),
    Detail { generation: u64, tagged_id: String },
}

/// Run every target of a plan concurrently and wait for all of them.
pub async fn run_plan(catalog: &Catalog, plan: FetchPlan) -> FetchOutcome {
    let requests = plan.targets.iter().map(|target| async move {
        let result = catalog
            .source_page(target.source, target.page, target.page_size)
            .await;
        (target.source, result)
    });
    let results = join_all(requests).await;
    FetchOutcome {
        generation: plan.generation,
        kind: plan.kind,
        results,
    }
}

/// Spawns fetch tasks on the current tokio runtime.
pub struct Dispatcher {
    catalog: Arc<Catalog>,
    tx: UnboundedSender<FetchMsg>,
}

impl Dispatcher {
    /// Create a dispatcher and the receiver the main loop should drain.
    pub fn new(catalog: Arc<Catalog>) -> (Self, UnboundedReceiver<FetchMsg>) {
        let (tx, rx) = unbounded_channel();
        (Self { catalog, tx }, rx)
    }

    pub fn dispatch(&self, command: Command) {
        let catalog = Arc::clone(&self.catalog);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let msg = match command {
                Command::Feed(plan) => FetchMsg::Feed(run_plan(&catalog, plan).await),
                Command::Detail {
                    generation,
                    tagged_id,
                } => FetchMsg::Detail {
                    generation,
                    result: catalog.get_artwork_details(&tagged_id).await,
                },
            };
            // If the receiver is gone the UI has exited; drop the result.
            let _ = tx.send(msg);
        });
    }
}
