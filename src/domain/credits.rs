use crate::error::AppResult;
use crate::services::LocalStorage;

pub const DATE_KEY: &str = "ticketZero_date";
pub const CREDITS_KEY: &str = "ticketZero_credits";

/// Remaining generations for one calendar day. Client-side only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditState {
    pub date: String,
    pub credits: u32,
    pub daily_limit: u32,
}

impl CreditState {
    /// Restores today's count, or resets to the limit when the stored day is stale.
    pub fn load(storage: &dyn LocalStorage, today: &str, daily_limit: u32) -> AppResult<Self> {
        let stored_date = storage.get_item(DATE_KEY)?;

        if stored_date.as_deref() != Some(today) {
            storage.set_item(DATE_KEY, today)?;
            storage.set_item(CREDITS_KEY, &daily_limit.to_string())?;
            tracing::debug!(today, daily_limit, "credit counter reset for a new day");
            return Ok(Self {
                date: today.to_string(),
                credits: daily_limit,
                daily_limit,
            });
        }

        let credits = storage
            .get_item(CREDITS_KEY)?
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .unwrap_or(daily_limit);

        Ok(Self {
            date: today.to_string(),
            credits,
            daily_limit,
        })
    }

    pub fn has_credits(&self) -> bool {
        self.credits > 0
    }

    /// Spends one credit and writes the new count back.
    pub fn consume(&mut self, storage: &dyn LocalStorage) -> AppResult<()> {
        self.credits = self.credits.saturating_sub(1);
        tracing::debug!(date = %self.date, credits = self.credits, "credit consumed");
        storage.set_item(CREDITS_KEY, &self.credits.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::local_storage::MemoryStorage;

    #[test]
    fn resets_when_stored_date_is_stale() {
        let storage = MemoryStorage::default();
        storage.set_item(DATE_KEY, "Sat Oct 17 2026").unwrap();
        storage.set_item(CREDITS_KEY, "3").unwrap();

        let state = CreditState::load(&storage, "Sun Oct 18 2026", 1500).unwrap();

        assert_eq!(state.credits, 1500);
        assert_eq!(
            storage.get_item(DATE_KEY).unwrap().as_deref(),
            Some("Sun Oct 18 2026")
        );
        assert_eq!(storage.get_item(CREDITS_KEY).unwrap().as_deref(), Some("1500"));
    }

    #[test]
    fn resets_on_first_run() {
        let storage = MemoryStorage::default();
        let state = CreditState::load(&storage, "Sun Oct 18 2026", 10).unwrap();
        assert_eq!(state.credits, 10);
    }

    #[test]
    fn restores_count_for_the_same_day() {
        let storage = MemoryStorage::default();
        storage.set_item(DATE_KEY, "Sun Oct 18 2026").unwrap();
        storage.set_item(CREDITS_KEY, "7").unwrap();

        let state = CreditState::load(&storage, "Sun Oct 18 2026", 1500).unwrap();
        assert_eq!(state.credits, 7);
    }

    #[test]
    fn unparsable_count_falls_back_to_limit() {
        let storage = MemoryStorage::default();
        storage.set_item(DATE_KEY, "Sun Oct 18 2026").unwrap();
        storage.set_item(CREDITS_KEY, "NaN").unwrap();

        let state = CreditState::load(&storage, "Sun Oct 18 2026", 20).unwrap();
        assert_eq!(state.credits, 20);
    }

    #[test]
    fn consume_decrements_by_one_and_persists() {
        let storage = MemoryStorage::default();
        let mut state = CreditState::load(&storage, "Sun Oct 18 2026", 5).unwrap();

        state.consume(&storage).unwrap();

        assert_eq!(state.credits, 4);
        assert_eq!(storage.get_item(CREDITS_KEY).unwrap().as_deref(), Some("4"));
    }

    #[test]
    fn consume_never_goes_negative() {
        let storage = MemoryStorage::default();
        let mut state = CreditState::load(&storage, "Sun Oct 18 2026", 0).unwrap();
        assert!(!state.has_credits());
        state.consume(&storage).unwrap();
        assert_eq!(state.credits, 0);
    }
}
