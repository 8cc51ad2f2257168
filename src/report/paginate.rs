use crate::api::Page;
use crate::Result;
use anyhow::bail;
use std::collections::HashSet;
use std::future::Future;
use tracing::{debug, trace};

/// Drains a cursor-paginated query.
///
/// `first` is the response to the initial (token-less) request. While the latest page carries a
/// continuation token, `next` is called with that token to fetch the following page. Items are
/// returned in the order the pages arrived; nothing is re-sorted. A missing first response yields
/// no items. Errors from `next` are returned as-is and nothing is retried.
pub async fn accumulate<T, F, Fut>(first: Option<Page<T>>, mut next: F) -> Result<Vec<T>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let Some(mut page) = first else {
        trace!("No initial response, nothing to accumulate");
        return Ok(Vec::new());
    };

    let mut items = Vec::new();
    let mut pages = 1usize;
    let mut seen = HashSet::new();
    loop {
        items.append(&mut page.items);
        let token = match page.next_token.take() {
            Some(token) if !token.is_empty() => token,
            _ => break,
        };
        if !seen.insert(token.clone()) {
            bail!("The API returned the page token '{token}' more than once");
        }
        trace!("Fetching page {} with token {token}", pages + 1);
        page = next(token).await?;
        pages += 1;
    }

    debug!("Accumulated {} items from {pages} page(s)", items.len());
    Ok(items)
}
