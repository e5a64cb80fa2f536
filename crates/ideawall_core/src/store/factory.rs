use crate::clock::{Clock, SystemClock};
use crate::config::{NoteDefaults, Placement};
use crate::model::note::{Note, NoteDraft, Position};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use uuid::Builder;

/// Builds complete notes from drafts: id, timestamps, tilt, placement.
///
/// Randomness comes from one `StdRng`, so a seeded factory produces the same
/// ids, tilts and scatter positions on every run.
pub struct NoteFactory {
    clock: Arc<dyn Clock>,
    rng: StdRng,
    defaults: NoteDefaults,
}

impl NoteFactory {
    pub fn new(clock: Arc<dyn Clock>, rng: StdRng, defaults: NoteDefaults) -> Self {
        Self {
            clock,
            rng,
            defaults,
        }
    }

    /// System clock, entropy-seeded generator.
    pub fn with_defaults(defaults: NoteDefaults) -> Self {
        Self::new(Arc::new(SystemClock), StdRng::from_entropy(), defaults)
    }

    pub fn seeded(clock: Arc<dyn Clock>, seed: u64, defaults: NoteDefaults) -> Self {
        Self::new(clock, StdRng::seed_from_u64(seed), defaults)
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    pub fn defaults(&self) -> &NoteDefaults {
        &self.defaults
    }

    /// Returns `None` when the draft title is blank.
    pub fn build(&mut self, draft: NoteDraft) -> Option<Note> {
        let title = draft.normalized_title()?.to_string();
        let id = Builder::from_random_bytes(self.rng.gen()).into_uuid();
        let rotation = self.rotation(draft.rotation);
        let position = match draft.position.filter(|p| p.x.is_finite() && p.y.is_finite()) {
            Some(position) => position,
            None => self.placement(),
        };
        let now = self.clock.now_ms();

        Some(Note {
            id,
            title,
            content: draft.content,
            position,
            size: self.defaults.size,
            rotation,
            color: draft.color.unwrap_or_else(|| self.defaults.color.clone()),
            created_at: now,
            updated_at: now,
        })
    }

    fn rotation(&mut self, requested: Option<f64>) -> f64 {
        let max = self.defaults.max_rotation_deg.max(0.0);
        match requested.filter(|value| value.is_finite()) {
            Some(value) => value.clamp(-max, max),
            None if max > 0.0 => self.rng.gen_range(-max..=max),
            None => 0.0,
        }
    }

    fn placement(&mut self) -> Position {
        match self.defaults.placement {
            Placement::Fixed { x, y } => Position::new(x, y),
            Placement::Scatter {
                min_x,
                min_y,
                max_x,
                max_y,
            } => {
                let x = min_x + (max_x - min_x) * self.rng.gen::<f64>();
                let y = min_y + (max_y - min_y) * self.rng.gen::<f64>();
                Position::new(x, y)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::NoteFactory;
    use crate::clock::ManualClock;
    use crate::config::{NoteDefaults, Placement};
    use crate::model::note::{NoteDraft, Position};
    use std::sync::Arc;

    fn factory(defaults: NoteDefaults) -> NoteFactory {
        NoteFactory::seeded(Arc::new(ManualClock::new(1_000)), 7, defaults)
    }

    #[test]
    fn build_fills_defaults() {
        let mut factory = factory(NoteDefaults::default());
        let note = factory
            .build(NoteDraft::new(" Idea ", "Test"))
            .expect("note should build");
        assert_eq!(note.title, "Idea");
        assert_eq!(note.created_at, 1_000);
        assert_eq!(note.created_at, note.updated_at);
        assert_eq!(note.position, Position::new(50.0, 50.0));
        assert!(note.rotation.abs() <= 5.0);
        assert_eq!(note.id.get_version_num(), 4);
        note.validate().expect("built note should be valid");
    }

    #[test]
    fn blank_title_builds_nothing() {
        let mut factory = factory(NoteDefaults::default());
        assert!(factory.build(NoteDraft::new("   ", "Test")).is_none());
    }

    #[test]
    fn explicit_rotation_is_clamped() {
        let mut factory = factory(NoteDefaults::default());
        let note = factory
            .build(NoteDraft::new("Tilted", "").with_rotation(40.0))
            .expect("note should build");
        assert_eq!(note.rotation, 5.0);
    }

    #[test]
    fn scatter_placement_stays_in_bounds() {
        let mut factory = factory(NoteDefaults {
            placement: Placement::Scatter {
                min_x: 50.0,
                min_y: 60.0,
                max_x: 400.0,
                max_y: 300.0,
            },
            max_rotation_deg: 0.0,
            ..NoteDefaults::default()
        });
        for _ in 0..50 {
            let note = factory.build(NoteDraft::new("n", "")).expect("note");
            assert!((50.0..=400.0).contains(&note.position.x));
            assert!((60.0..=300.0).contains(&note.position.y));
            assert_eq!(note.rotation, 0.0);
        }
    }

    #[test]
    fn same_seed_yields_same_ids() {
        let first = factory(NoteDefaults::default())
            .build(NoteDraft::new("a", ""))
            .expect("note");
        let second = factory(NoteDefaults::default())
            .build(NoteDraft::new("a", ""))
            .expect("note");
        assert_eq!(first.id, second.id);
    }
}
