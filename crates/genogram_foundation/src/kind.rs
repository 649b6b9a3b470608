//! Closed kind sets: entity variants, event kinds, and relationship kinds.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The variant of a graph entity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum EntityKind {
    /// An individual.
    Person,
    /// A marriage or committed partnership between two people.
    PairBond,
    /// The edge recording that a person is a child of a pair-bond.
    ChildOf,
    /// Twins, triplets, and so on.
    MultipleBirth,
    /// A relationship-process link.
    Emotion,
    /// A dated occurrence.
    Event,
    /// A named alternate view.
    Layer,
}

impl EntityKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Person,
        Self::PairBond,
        Self::ChildOf,
        Self::MultipleBirth,
        Self::Emotion,
        Self::Event,
        Self::Layer,
    ];

    /// Returns the `snake_case` name used in persisted records.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::PairBond => "pair_bond",
            Self::ChildOf => "child_of",
            Self::MultipleBirth => "multiple_birth",
            Self::Emotion => "emotion",
            Self::Event => "event",
            Self::Layer => "layer",
        }
    }

    /// Restore rank: an entity may only reference entities of a strictly lower rank.
    ///
    /// Re-attaching in ascending rank therefore always finds every target live,
    /// and detaching in descending rank never strands a dependent.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Person | Self::Layer => 0,
            Self::PairBond => 1,
            Self::MultipleBirth | Self::Emotion => 2,
            Self::ChildOf => 3,
            Self::Event => 4,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of a dated event.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum EventKind {
    /// Start of a bond.
    Bonded,
    /// Wedding.
    Married,
    /// Birth of a person.
    Birth,
    /// Adoption of a person.
    Adopted,
    /// A couple moved.
    Moved,
    /// A couple separated.
    Separated,
    /// A couple divorced.
    Divorced,
    /// Death of a person.
    Death,
    /// Free-form shift in a tracked variable.
    VariableShift,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Bonded,
        Self::Married,
        Self::Birth,
        Self::Adopted,
        Self::Moved,
        Self::Separated,
        Self::Divorced,
        Self::Death,
        Self::VariableShift,
    ];

    /// Returns the persisted slug.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Bonded => "bonded",
            Self::Married => "married",
            Self::Birth => "birth",
            Self::Adopted => "adopted",
            Self::Moved => "moved",
            Self::Separated => "separated",
            Self::Divorced => "divorced",
            Self::Death => "death",
            Self::VariableShift => "variable-shift",
        }
    }

    /// Parses a slug.
    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.slug() == slug)
    }

    /// Built-in kinds occur at most once per parent.
    #[must_use]
    pub const fn is_built_in(self) -> bool {
        !matches!(self, Self::Moved | Self::VariableShift)
    }

    /// Entity kinds an event of this kind may be attached to.
    #[must_use]
    pub const fn parent_kinds(self) -> &'static [EntityKind] {
        match self {
            Self::Birth | Self::Adopted | Self::Death => &[EntityKind::Person],
            Self::Bonded | Self::Married | Self::Moved | Self::Separated | Self::Divorced => {
                &[EntityKind::PairBond]
            }
            Self::VariableShift => &[
                EntityKind::Person,
                EntityKind::PairBond,
                EntityKind::Emotion,
            ],
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Kind of an emotional-process link.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "kebab-case")
)]
#[allow(missing_docs)]
pub enum RelationshipKind {
    Fusion,
    Conflict,
    Distance,
    Overfunctioning,
    Underfunctioning,
    Projection,
    DefinedSelf,
    Toward,
    Away,
    Inside,
    Outside,
    Cutoff,
}

impl RelationshipKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 12] = [
        Self::Fusion,
        Self::Conflict,
        Self::Distance,
        Self::Overfunctioning,
        Self::Underfunctioning,
        Self::Projection,
        Self::DefinedSelf,
        Self::Toward,
        Self::Away,
        Self::Inside,
        Self::Outside,
        Self::Cutoff,
    ];

    /// Returns the persisted slug.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Fusion => "fusion",
            Self::Conflict => "conflict",
            Self::Distance => "distance",
            Self::Overfunctioning => "overfunctioning",
            Self::Underfunctioning => "underfunctioning",
            Self::Projection => "projection",
            Self::DefinedSelf => "defined-self",
            Self::Toward => "toward",
            Self::Away => "away",
            Self::Inside => "inside",
            Self::Outside => "outside",
            Self::Cutoff => "cutoff",
        }
    }

    /// Parses a slug.
    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.slug() == slug)
    }

    /// Monadic kinds have a single endpoint.
    #[must_use]
    pub const fn is_monadic(self) -> bool {
        matches!(self, Self::Cutoff)
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}
