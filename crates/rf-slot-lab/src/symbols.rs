//! Symbol identifiers and reel strips
//!
//! A [`SymbolStrip`] is the finite backing store of an endlessly scrolling
//! reel. Slots never move inside the backing array; the strip keeps a
//! permutation from spatial rank (leftmost first) to physical slot, so
//! "which slot holds which position" is always explicit.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Opaque symbol identifier, resolved to a visual asset by collaborators
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(String);

impl SymbolId {
    const FALLBACK: &'static str = "blank";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier used when the symbol set has nothing to draw from
    pub fn fallback() -> Self {
        Self(Self::FALLBACK.to_string())
    }

    pub fn is_fallback(&self) -> bool {
        self.0 == Self::FALLBACK
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SymbolId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// The symbols a reel draws from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolSet {
    ids: Vec<SymbolId>,
}

impl SymbolSet {
    pub fn new(ids: Vec<SymbolId>) -> Self {
        Self { ids }
    }

    /// Build a set from plain names
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: names.into_iter().map(SymbolId::new).collect(),
        }
    }

    /// Uniform draw; an empty set yields [`SymbolId::fallback`]
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> SymbolId {
        if self.ids.is_empty() {
            return SymbolId::fallback();
        }
        self.ids[rng.random_range(0..self.ids.len())].clone()
    }

    pub fn contains(&self, id: &SymbolId) -> bool {
        self.ids.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolId> {
        self.ids.iter()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl Default for SymbolSet {
    fn default() -> Self {
        Self::from_names([
            "symbol1.png",
            "symbol2.png",
            "symbol3.png",
            "symbol4.png",
            "symbol5.png",
        ])
    }
}

/// One position on a strip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSlot {
    /// Horizontal position (position units)
    pub offset: f64,
    pub symbol: SymbolId,
}

/// Fixed-length strip of symbol slots belonging to one reel
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolStrip {
    slots: Vec<SymbolSlot>,
    /// Spatial rank -> physical slot index
    order: Vec<usize>,
}

impl SymbolStrip {
    /// `count` slots at `0, size, 2*size, ...`, each with a random symbol
    pub fn create<R: Rng + ?Sized>(
        count: usize,
        size: f64,
        symbols: &SymbolSet,
        rng: &mut R,
    ) -> Self {
        let slots = (0..count)
            .map(|i| SymbolSlot {
                offset: i as f64 * size,
                symbol: symbols.draw(rng),
            })
            .collect();
        Self::from_slots(slots)
    }

    /// Wrap existing slots; spatial order is established by offset
    pub fn from_slots(slots: Vec<SymbolSlot>) -> Self {
        let mut strip = Self {
            order: (0..slots.len()).collect(),
            slots,
        };
        strip.sort_by_offset();
        strip
    }

    /// Shift every slot by `delta_offset`
    pub fn advance(&mut self, delta_offset: f64) {
        for slot in &mut self.slots {
            slot.offset += delta_offset;
        }
    }

    /// Recycle slots that reached `boundary` to the left of the current
    /// leftmost slot, with a fresh symbol. Returns how many were recycled.
    ///
    /// A strip that overshot by whole laps (`len * size` each) is first
    /// shifted back by those laps, so afterwards every slot is below
    /// `boundary` however far one step moved it.
    pub fn wrap_if_beyond<R: Rng + ?Sized>(
        &mut self,
        boundary: f64,
        size: f64,
        symbols: &SymbolSet,
        rng: &mut R,
    ) -> usize {
        let mut recycled = 0;

        let period = self.slots.len() as f64 * size;
        if let Some(min) = self.min_offset().filter(|&min| min >= boundary && period > 0.0) {
            let laps = ((min - boundary) / period).floor() + 1.0;
            for slot in &mut self.slots {
                slot.offset -= laps * period;
                slot.symbol = symbols.draw(rng);
            }
            recycled += self.slots.len() * laps as usize;
        }

        for index in 0..self.slots.len() {
            if self.slots[index].offset < boundary {
                continue;
            }

            let min = self.min_offset().unwrap_or(0.0);
            let slot = &mut self.slots[index];
            slot.offset = min - size;
            slot.symbol = symbols.draw(rng);

            // The recycled slot is now the leftmost one
            if let Some(rank) = self.order.iter().position(|&i| i == index) {
                self.order.remove(rank);
            }
            self.order.insert(0, index);
            recycled += 1;
        }

        recycled
    }

    /// Stable re-sort of the spatial order by offset
    pub fn sort_by_offset(&mut self) {
        let slots = &self.slots;
        self.order
            .sort_by(|&a, &b| slots[a].offset.total_cmp(&slots[b].offset));
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot at a spatial rank (0 = leftmost)
    pub fn slot(&self, rank: usize) -> Option<&SymbolSlot> {
        self.order.get(rank).map(|&i| &self.slots[i])
    }

    /// Slots left to right
    pub fn spatial(&self) -> impl Iterator<Item = &SymbolSlot> {
        self.order.iter().map(move |&i| &self.slots[i])
    }

    /// Offsets left to right
    pub fn offsets(&self) -> Vec<f64> {
        self.spatial().map(|s| s.offset).collect()
    }

    /// Symbols left to right
    pub fn symbols(&self) -> Vec<SymbolId> {
        self.spatial().map(|s| s.symbol.clone()).collect()
    }

    /// Spatial rank -> physical slot index
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn min_offset(&self) -> Option<f64> {
        self.slots.iter().map(|s| s.offset).reduce(f64::min)
    }

    pub fn max_offset(&self) -> Option<f64> {
        self.slots.iter().map(|s| s.offset).reduce(f64::max)
    }

    pub(crate) fn offset_mut(&mut self, rank: usize) -> &mut f64 {
        let index = self.order[rank];
        &mut self.slots[index].offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn test_create_lays_out_grid() {
        let symbols = SymbolSet::default();
        let strip = SymbolStrip::create(6, 150.0, &symbols, &mut rng());

        assert_eq!(strip.len(), 6);
        assert_eq!(
            strip.offsets(),
            vec![0.0, 150.0, 300.0, 450.0, 600.0, 750.0]
        );
        assert!(strip.symbols().iter().all(|s| symbols.contains(s)));
    }

    #[test]
    fn test_advance_and_wrap() {
        let symbols = SymbolSet::default();
        let mut rng = rng();
        let mut strip = SymbolStrip::create(6, 150.0, &symbols, &mut rng);

        strip.advance(80.0);
        assert_eq!(
            strip.offsets(),
            vec![80.0, 230.0, 380.0, 530.0, 680.0, 830.0]
        );
        assert_eq!(strip.wrap_if_beyond(900.0, 150.0, &symbols, &mut rng), 0);

        strip.advance(80.0);
        // 910 crosses the boundary and moves to min (160) - 150
        assert_eq!(strip.wrap_if_beyond(900.0, 150.0, &symbols, &mut rng), 1);
        assert_eq!(
            strip.offsets(),
            vec![10.0, 160.0, 310.0, 460.0, 610.0, 760.0]
        );
        assert_eq!(strip.order()[0], 5);
        assert!(symbols.contains(&strip.slot(0).unwrap().symbol));
    }

    #[test]
    fn test_wrap_uses_current_minimum() {
        let symbols = SymbolSet::default();
        let mut rng = rng();
        let slot = |offset: f64| SymbolSlot {
            offset,
            symbol: SymbolId::new("symbol1.png"),
        };
        let mut strip = SymbolStrip::from_slots(vec![slot(905.0), slot(-40.0), slot(950.0)]);

        assert_eq!(strip.wrap_if_beyond(900.0, 150.0, &symbols, &mut rng), 2);
        // 905 -> -40 - 150, then 950 -> -190 - 150
        assert_eq!(strip.offsets(), vec![-340.0, -190.0, -40.0]);
        assert_eq!(strip.order(), &[2, 0, 1]);
    }

    #[test]
    fn test_wrap_after_overshooting_whole_laps() {
        let symbols = SymbolSet::default();
        let mut rng = rng();
        let mut strip = SymbolStrip::create(6, 150.0, &symbols, &mut rng);

        strip.advance(2000.0);
        // 2000 - 2 * 900 = 200, then 950 wraps to 200 - 150
        assert_eq!(strip.wrap_if_beyond(900.0, 150.0, &symbols, &mut rng), 13);
        assert_eq!(
            strip.offsets(),
            vec![50.0, 200.0, 350.0, 500.0, 650.0, 800.0]
        );
        assert!(strip.symbols().iter().all(|s| symbols.contains(s)));
    }

    #[test]
    fn test_wrap_keeps_every_slot_below_boundary() {
        let symbols = SymbolSet::default();
        let mut rng = rng();
        let mut strip = SymbolStrip::create(6, 150.0, &symbols, &mut rng);

        for step in [4500.0, 899.0, 900.0, 12_345.5, 1.0] {
            strip.advance(step);
            strip.wrap_if_beyond(900.0, 150.0, &symbols, &mut rng);
            let offsets = strip.offsets();
            assert!(offsets.iter().all(|&o| o < 900.0), "{:?}", offsets);
            assert!(offsets.iter().any(|&o| o >= 0.0), "{:?}", offsets);
        }
    }

    #[test]
    fn test_sort_by_offset_is_stable() {
        let slot = |offset: f64, id: &str| SymbolSlot {
            offset,
            symbol: SymbolId::new(id),
        };
        let mut strip = SymbolStrip::from_slots(vec![
            slot(300.0, "c"),
            slot(0.0, "a"),
            slot(0.0, "b"),
        ]);

        strip.sort_by_offset();
        let names: Vec<String> = strip.symbols().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(strip.order(), &[1, 2, 0]);
    }

    #[test]
    fn test_empty_symbol_set_uses_fallback() {
        let empty = SymbolSet::new(Vec::new());
        let strip = SymbolStrip::create(3, 100.0, &empty, &mut rng());

        assert!(strip.symbols().iter().all(SymbolId::is_fallback));
    }

    #[test]
    fn test_draw_covers_set() {
        let symbols = SymbolSet::from_names(["x", "y"]);
        let mut rng = rng();
        let draws: Vec<SymbolId> = (0..64).map(|_| symbols.draw(&mut rng)).collect();

        assert!(draws.contains(&SymbolId::new("x")));
        assert!(draws.contains(&SymbolId::new("y")));
    }

    #[test]
    fn test_symbol_set_serde() {
        let set: SymbolSet = serde_json::from_str(r#"["cherry", "bell"]"#).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["cherry","bell"]"#);
    }
}
