//! Dashboard pages a logged in coder browses.

use goose::prelude::*;
use log::debug;
use std::sync::Arc;

use crate::auth::CoderSession;

/// A page loaded by a plain GET, and how often it is picked relative to the
/// other pages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub path: &'static str,
    pub weight: usize,
}

/// The dashboard is loaded three times as often as any other page.
pub const CODER_PAGES: [Page; 6] = [
    Page {
        path: "/coder/dashboard",
        weight: 3,
    },
    Page {
        path: "/coder/reports",
        weight: 1,
    },
    Page {
        path: "/coder/ekskul",
        weight: 1,
    },
    Page {
        path: "/coder/makeup",
        weight: 1,
    },
    Page {
        path: "/coder/materials",
        weight: 1,
    },
    Page {
        path: "/coder/profile",
        weight: 1,
    },
];

/// Builds the transaction loading `page`. The transaction is named with the
/// page path, so its requests show up in metrics as `GET <path>`.
pub fn page_transaction(page: Page) -> Result<Transaction, GooseError> {
    let path = page.path;

    let closure: TransactionFunction = Arc::new(move |user| {
        Box::pin(async move {
            // Users that failed to log in stay idle until the load test ends.
            if user.get_session_data::<CoderSession>().is_none() {
                debug!(
                    "user {}: not logged in, skipping {}",
                    user.weighted_users_index, path
                );
                tokio::task::yield_now().await;
                return Ok(());
            }

            let _goose = user.get(path).await?;

            Ok(())
        })
    });

    Transaction::new(closure)
        .set_name(path)
        .set_weight(page.weight)
}
