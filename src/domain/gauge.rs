/// Bounded resource gauges (health, fire charge) and their HUD tiers.
///
/// Tier mapping is a pure step function of the value:
///
///   Health (6 sprites):       100 → 5, >80 → 4, >60 → 3, >40 → 2, >20 → 1, else 0
///   Fire charge (13 sprites): floor(value / 10), clamped to 0..=12

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum GaugeKind {
    Health,
    FireCharge,
}

impl GaugeKind {
    pub fn tier_count(self) -> usize {
        match self {
            GaugeKind::Health => 6,
            GaugeKind::FireCharge => 13,
        }
    }

    pub fn tier(self, value: f32) -> usize {
        match self {
            GaugeKind::Health => {
                if value >= 100.0 { 5 }
                else if value > 80.0 { 4 }
                else if value > 60.0 { 3 }
                else if value > 40.0 { 2 }
                else if value > 20.0 { 1 }
                else { 0 }
            }
            GaugeKind::FireCharge => {
                let step = (value.max(0.0) / 10.0).floor() as usize;
                step.min(self.tier_count() - 1)
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct ResourceGauge {
    kind: GaugeKind,
    value: f32,
    max: f32,
}

impl ResourceGauge {
    pub fn new(kind: GaugeKind, initial: f32, max: f32) -> Self {
        let mut gauge = ResourceGauge { kind, value: 0.0, max };
        gauge.set(initial);
        gauge
    }

    pub fn kind(&self) -> GaugeKind {
        self.kind
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn is_full(&self) -> bool {
        self.value >= self.max
    }

    /// Set the value, clamped to `[0, max]`.
    pub fn set(&mut self, value: f32) {
        self.value = value.clamp(0.0, self.max);
    }

    pub fn add(&mut self, amount: f32) {
        self.set(self.value + amount);
    }

    /// Deduct `amount` only if the gauge holds at least that much.
    pub fn try_spend(&mut self, amount: f32) -> bool {
        if self.value >= amount {
            self.set(self.value - amount);
            true
        } else {
            false
        }
    }

    /// Periodic refill. No-op at the cap; returns whether anything changed.
    pub fn regenerate(&mut self, amount: f32) -> bool {
        if self.is_full() {
            return false;
        }
        self.add(amount);
        true
    }

    pub fn tier(&self) -> usize {
        self.kind.tier(self.value)
    }
}
