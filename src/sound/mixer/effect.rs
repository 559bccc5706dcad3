// effect.rs - Post-mix effects

//! Post-mix effects: panning, simulated 3D position, distance attenuation
//! and stereo reversal.
//!
//! Effects are plain configuration. A channel (or the post-mix stage shared
//! by every channel) holds at most one stage of each kind in an
//! [`EffectChain`], and stages always run in [`EffectKind`] order. Where a
//! channel has its own chain, that chain runs before the post-mix chain.

use crate::sound::mixer::types::*;

/// Kinds of effect, in application order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EffectKind {
    Panning = 0,
    Position = 1,
    Distance = 2,
    ReverseStereo = 3,
}

impl EffectKind {
    /// All kinds in application order
    pub const ORDER: [EffectKind; 4] = [
        EffectKind::Panning,
        EffectKind::Position,
        EffectKind::Distance,
        EffectKind::ReverseStereo,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// One registered effect with its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectStage {
    /// Per-side volume, 0 (silent) to 255 (loud)
    Panning { left: u8, right: u8 },
    /// Angle in degrees (0 = front, 90 = right), already reduced mod 360
    Position { angle: i16, distance: u8 },
    /// Virtual distance, 0 (near) to 255 (far)
    Distance(u8),
    /// Left and right swapped
    ReverseStereo,
}

impl EffectStage {
    /// Panning stage, or `None` for the neutral `(255, 255)`
    pub fn panning(left: u8, right: u8) -> Option<Self> {
        if left == FX_LOUD && right == FX_LOUD {
            None
        } else {
            Some(EffectStage::Panning { left, right })
        }
    }

    /// Position stage, or `None` for the neutral angle 0 at distance 0
    pub fn position(angle: i16, distance: u8) -> Option<Self> {
        let angle = normalize_angle(angle);
        if angle == FX_NO_ANGLE && distance == FX_NO_DISTANCE {
            None
        } else {
            Some(EffectStage::Position { angle, distance })
        }
    }

    /// Distance stage, or `None` for distance 0
    pub fn distance(distance: u8) -> Option<Self> {
        if distance == FX_NO_DISTANCE {
            None
        } else {
            Some(EffectStage::Distance(distance))
        }
    }

    /// Reverse-stereo stage, or `None` when not flipping
    pub fn reverse_stereo(flip: bool) -> Option<Self> {
        flip.then_some(EffectStage::ReverseStereo)
    }

    /// Kind of this stage
    pub fn kind(&self) -> EffectKind {
        match self {
            EffectStage::Panning { .. } => EffectKind::Panning,
            EffectStage::Position { .. } => EffectKind::Position,
            EffectStage::Distance(_) => EffectKind::Distance,
            EffectStage::ReverseStereo => EffectKind::ReverseStereo,
        }
    }

    /// Applies the stage to one stereo frame
    pub fn process(&self, left: i16, right: i16) -> (i16, i16) {
        match *self {
            EffectStage::Panning {
                left: pan_l,
                right: pan_r,
            } => (scale(left, pan_l), scale(right, pan_r)),
            EffectStage::Position { angle, distance } => {
                let (amp_l, amp_r) = position_amplitudes(angle);
                let near = FX_LOUD - distance;
                (
                    scale(scale(left, amp_l), near),
                    scale(scale(right, amp_r), near),
                )
            }
            EffectStage::Distance(distance) => {
                let near = FX_LOUD - distance;
                (scale(left, near), scale(right, near))
            }
            EffectStage::ReverseStereo => (right, left),
        }
    }
}

/// Reduces an angle to `0..360`
pub fn normalize_angle(angle: i16) -> i16 {
    angle.rem_euclid(360)
}

/// Left/right amplitudes for a source at `angle`
///
/// 0 and 180 leave both sides loud, 90 silences the left side, 270 the right.
fn position_amplitudes(angle: i16) -> (u8, u8) {
    let angle = normalize_angle(angle) as i32;
    let loud = FX_LOUD as i32;
    let (left, right) = match angle {
        0..=89 => (loud - loud * angle / 90, loud),
        90..=179 => (loud * (angle - 90) / 90, loud),
        180..=269 => (loud, loud - loud * (angle - 180) / 90),
        _ => (loud, loud * (angle - 270) / 90),
    };
    (left as u8, right as u8)
}

fn scale(sample: i16, amount: u8) -> i16 {
    let scaled = sample as i32 * amount as i32 / FX_LOUD as i32;
    scaled.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

/// Effects registered on one target, at most one per kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectChain {
    stages: [Option<EffectStage>; 4],
}

impl EffectChain {
    /// An empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a stage, replacing the previous one of the same kind
    pub fn set(&mut self, stage: EffectStage) {
        self.stages[stage.kind().index()] = Some(stage);
    }

    /// Sets or clears the stage of `kind`
    pub fn update(&mut self, kind: EffectKind, stage: Option<EffectStage>) {
        match stage {
            Some(stage) if stage.kind() == kind => self.set(stage),
            _ => self.clear(kind),
        }
    }

    /// Unregisters the stage of `kind`
    pub fn clear(&mut self, kind: EffectKind) {
        self.stages[kind.index()] = None;
    }

    /// Unregisters every stage
    pub fn clear_all(&mut self) {
        self.stages = [None; 4];
    }

    /// Stage of `kind`, if registered
    pub fn get(&self, kind: EffectKind) -> Option<EffectStage> {
        self.stages[kind.index()]
    }

    /// Registered stages in application order
    pub fn stages(&self) -> impl Iterator<Item = EffectStage> + '_ {
        self.stages.iter().flatten().copied()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.stages.iter().all(Option::is_none)
    }

    /// Registered panning as `(left, right)`
    pub fn panning(&self) -> Option<(u8, u8)> {
        match self.get(EffectKind::Panning) {
            Some(EffectStage::Panning { left, right }) => Some((left, right)),
            _ => None,
        }
    }

    /// Runs every stage over one stereo frame
    pub fn process(&self, left: i16, right: i16) -> (i16, i16) {
        self.stages()
            .fold((left, right), |(l, r), stage| stage.process(l, r))
    }
}

/// Which effects a [`MixerEffect`] carries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MixerEffectType {
    pub panning: bool,
    pub position: bool,
    pub distance: bool,
    pub reverse_stereo: bool,
}

impl MixerEffectType {
    /// True when no effect is selected
    pub fn is_none(&self) -> bool {
        *self == MixerEffectType::default()
    }
}

/// Effects and loop count applied when playing a chunk in a group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MixerEffect {
    pub kind: MixerEffectType,
    pub pan_left: u8,
    pub pan_right: u8,
    pub pos_angle: i16,
    pub pos_distance: u8,
    pub distance: u8,
    pub rev_stereo: bool,
    pub loops: i32,
}

impl MixerEffect {
    /// No effect, played once
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_panning(mut self, left: u8, right: u8) -> Self {
        self.kind.panning = true;
        self.pan_left = left;
        self.pan_right = right;
        self
    }

    pub fn with_position(mut self, angle: i16, distance: u8) -> Self {
        self.kind.position = true;
        self.pos_angle = angle;
        self.pos_distance = distance;
        self
    }

    pub fn with_distance(mut self, distance: u8) -> Self {
        self.kind.distance = true;
        self.distance = distance;
        self
    }

    pub fn with_reverse_stereo(mut self, flip: bool) -> Self {
        self.kind.reverse_stereo = true;
        self.rev_stereo = flip;
        self
    }

    pub fn with_loops(mut self, loops: i32) -> Self {
        self.loops = loops;
        self
    }

    /// Stages to register, in application order
    ///
    /// Selected effects whose parameters are neutral produce no stage.
    pub fn stages(&self) -> Vec<EffectStage> {
        let mut stages = Vec::new();
        if self.kind.panning {
            stages.extend(EffectStage::panning(self.pan_left, self.pan_right));
        }
        if self.kind.position {
            stages.extend(EffectStage::position(self.pos_angle, self.pos_distance));
        }
        if self.kind.distance {
            stages.extend(EffectStage::distance(self.distance));
        }
        if self.kind.reverse_stereo {
            stages.extend(EffectStage::reverse_stereo(self.rev_stereo));
        }
        stages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0)]
    #[case(60, 60)]
    #[case(360, 0)]
    #[case(720, 0)]
    #[case(-90, 270)]
    #[case(-360, 0)]
    #[case(i16::MIN, 352)]
    fn test_normalize_angle(#[case] angle: i16, #[case] expected: i16) {
        assert_eq!(normalize_angle(angle), expected);
    }

    #[test]
    fn test_neutral_values_produce_no_stage() {
        assert_eq!(EffectStage::panning(255, 255), None);
        assert_eq!(EffectStage::position(0, 0), None);
        assert_eq!(EffectStage::position(360, 0), None);
        assert_eq!(EffectStage::distance(0), None);
        assert_eq!(EffectStage::reverse_stereo(false), None);

        assert!(EffectStage::panning(255, 0).is_some());
        assert!(EffectStage::position(0, 10).is_some());
        assert!(EffectStage::distance(1).is_some());
        assert!(EffectStage::reverse_stereo(true).is_some());
    }

    #[test]
    fn test_chain_keeps_one_stage_per_kind() {
        let mut chain = EffectChain::new();
        chain.set(EffectStage::Panning { left: 255, right: 0 });
        chain.set(EffectStage::Panning { left: 0, right: 255 });
        assert_eq!(chain.stages().count(), 1);
        assert_eq!(chain.panning(), Some((0, 255)));
    }

    #[test]
    fn test_chain_order_is_fixed() {
        let mut chain = EffectChain::new();
        chain.set(EffectStage::ReverseStereo);
        chain.set(EffectStage::Distance(10));
        chain.set(EffectStage::Position { angle: 90, distance: 0 });
        chain.set(EffectStage::Panning { left: 1, right: 2 });

        let kinds: Vec<EffectKind> = chain.stages().map(|s| s.kind()).collect();
        assert_eq!(kinds, EffectKind::ORDER.to_vec());
    }

    #[test]
    fn test_chain_update_clears_on_none() {
        let mut chain = EffectChain::new();
        chain.set(EffectStage::Distance(64));
        chain.update(EffectKind::Distance, EffectStage::distance(0));
        assert!(chain.is_empty());
    }

    #[test]
    fn test_panning_process() {
        let stage = EffectStage::Panning { left: 255, right: 0 };
        assert_eq!(stage.process(1000, 1000), (1000, 0));
    }

    #[test]
    fn test_reverse_stereo_process() {
        assert_eq!(EffectStage::ReverseStereo.process(10, -10), (-10, 10));
    }

    #[test]
    fn test_distance_attenuates() {
        let (l, r) = EffectStage::Distance(255).process(i16::MAX, i16::MIN);
        assert_eq!((l, r), (0, 0));
        let (l, _) = EffectStage::Distance(128).process(1020, 0);
        assert_eq!(l, 508);
    }

    #[rstest]
    #[case(0, (255, 255))]
    #[case(90, (0, 255))]
    #[case(180, (255, 255))]
    #[case(270, (255, 0))]
    #[case(45, (128, 255))]
    fn test_position_amplitudes(#[case] angle: i16, #[case] expected: (u8, u8)) {
        assert_eq!(position_amplitudes(angle), expected);
    }

    #[test]
    fn test_chain_process_runs_in_order() {
        // Panning silences the left side before the swap moves it right
        let mut chain = EffectChain::new();
        chain.set(EffectStage::ReverseStereo);
        chain.set(EffectStage::Panning { left: 0, right: 255 });
        assert_eq!(chain.process(500, 300), (300, 0));
    }

    #[test]
    fn test_mixer_effect_stages() {
        let effect = MixerEffect::none()
            .with_reverse_stereo(true)
            .with_panning(255, 0)
            .with_distance(0)
            .with_loops(2);

        assert_eq!(
            effect.stages(),
            vec![
                EffectStage::Panning { left: 255, right: 0 },
                EffectStage::ReverseStereo,
            ]
        );
        assert_eq!(effect.loops, 2);
        assert!(effect.kind.distance);
        assert!(MixerEffect::none().kind.is_none());
        assert!(MixerEffect::none().stages().is_empty());
    }
}
