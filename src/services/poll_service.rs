use std::io::Write;

use tracing::{debug, error, info, warn};

use crate::config::{describe_interval, PollConfig};
use crate::domain::{FeedHealth, FeedState, StateMap};
use crate::errors::{TailError, TailResult};
use crate::format::Formatter;
use crate::services::selection::{fresh_entries, unseen_in_order, SeenSet, SelectOptions};
use crate::services::watermark::next_state;
use crate::shutdown::Shutdown;
use crate::sources::FeedFetcher;
use crate::storage::StateStore;

/// Drives the poll loop: fetch, select, format and emit, remember.
pub struct PollService<'a, F: FeedFetcher> {
    config: &'a PollConfig,
    fetcher: F,
    formatter: Formatter,
    store: Option<Box<dyn StateStore>>,
    shutdown: Shutdown,
}

impl<'a, F: FeedFetcher> PollService<'a, F> {
    pub fn new(config: &'a PollConfig, fetcher: F) -> Self {
        Self {
            config,
            fetcher,
            formatter: config.output.formatter(),
            store: None,
            shutdown: Shutdown::new(),
        }
    }

    pub fn with_store(mut self, store: Box<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Poll every URL until the iteration cap is reached or an interrupt
    /// arrives, starting from `states`. Returns the final per-URL state.
    pub fn run<W: Write>(&self, out: &mut W, states: StateMap) -> TailResult<StateMap> {
        let mut states = states;
        let mut seen = self.config.unique.then(SeenSet::new);
        let options = SelectOptions {
            initial: self.config.initial,
            newer: self.config.newer,
            reverse: self.config.reverse,
        };

        debug!("using format: {:?}", self.formatter.template());
        debug!("using time format: {:?}", self.formatter.time_format());

        let mut iteration: u32 = 0;
        loop {
            if iteration > 0 {
                if self.config.iterations.is_some_and(|cap| iteration >= cap) {
                    info!("finished after {} iterations", iteration);
                    return Ok(states);
                }

                let (value, unit) = describe_interval(self.config.interval.as_secs());
                debug!("sleeping for {} {}", value, unit);
                if self.shutdown.sleep(self.config.interval) {
                    return self.interrupted(states);
                }
            }

            for url in &self.config.urls {
                if self.shutdown.is_triggered() {
                    return self.interrupted(states);
                }

                let prior = states.get(url).cloned().unwrap_or_default();
                match self.poll_url(out, url, iteration, &prior, &options, seen.as_mut()) {
                    Ok(state) => {
                        states.insert(url.clone(), state);
                    }
                    Err(e @ TailError::Output(_)) => return Err(e),
                    Err(e) if self.config.fail_fast => return Err(e),
                    Err(e) => error!("{}", e),
                }
            }

            self.persist(&states)?;
            iteration = iteration.saturating_add(1);
        }
    }

    fn poll_url<W: Write>(
        &self,
        out: &mut W,
        url: &str,
        iteration: u32,
        prior: &FeedState,
        options: &SelectOptions,
        seen: Option<&mut SeenSet>,
    ) -> TailResult<FeedState> {
        debug!("fetching {}", url);
        let mut feed = self.fetcher.fetch(url, &prior.validators())?;

        match &feed.health {
            FeedHealth::Clean => {}
            FeedHealth::EncodingOverride(reason) => debug!("{}: {}", url, reason),
            FeedHealth::Malformed(reason) => {
                return Err(TailError::MalformedFeed {
                    url: url.to_string(),
                    reason: reason.clone(),
                });
            }
        }

        let entries = std::mem::take(&mut feed.entries);
        let fresh = fresh_entries(entries, iteration, prior.updated, options);
        let selected = unseen_in_order(&fresh, options, seen);

        if !selected.is_empty() {
            debug!("writing {} new entries from {}", selected.len(), url);
        }
        for entry in &selected {
            out.write_all(self.formatter.format(entry).as_bytes())
                .map_err(TailError::Output)?;
        }
        out.flush().map_err(TailError::Output)?;

        Ok(next_state(prior, &feed, &fresh))
    }

    fn persist(&self, states: &StateMap) -> TailResult<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };

        match store.save(states) {
            Ok(()) => Ok(()),
            Err(e) if self.config.fail_fast => Err(e),
            Err(e) => {
                warn!("cannot save feed state: {}", e);
                Ok(())
            }
        }
    }

    fn interrupted(&self, states: StateMap) -> TailResult<StateMap> {
        info!("interrupted, exiting");
        self.persist(&states)?;
        Ok(states)
    }
}
