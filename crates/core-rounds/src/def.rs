use derive_where::derive_where;

use roundfsm_core_types::{Context, DataError, PayloadKind, SynchronizedData};

use crate::{Collection, Quorum};

/// What a round decided, handed to its update function.
#[derive_where(Copy, Clone, Debug)]
pub struct Outcome<'a, Ctx: Context> {
    /// The winning body, for rounds that select a single one.
    pub value: Option<&'a Ctx::Body>,

    /// Every payload the round collected.
    pub collection: &'a Collection<Ctx>,
}

/// A pure function computing the synchronized data a round hands to its successor.
pub type UpdateFn<Ctx> = for<'a> fn(
    &SynchronizedData<Ctx>,
    &Outcome<'a, Ctx>,
) -> Result<SynchronizedData<Ctx>, DataError>;

/// Update function of rounds that do not change the synchronized data.
pub fn keep_data<Ctx: Context>(
    data: &SynchronizedData<Ctx>,
    _: &Outcome<'_, Ctx>,
) -> Result<SynchronizedData<Ctx>, DataError> {
    Ok(data.clone())
}

/// The definition of a round class: the payloads it accepts, how it
/// concludes and what it hands to its successor.
#[derive_where(Clone, Debug)]
pub struct RoundDef<Ctx: Context> {
    /// Identifier of the round class.
    pub id: Ctx::RoundId,

    /// When and how the round concludes.
    pub quorum: Quorum<Ctx>,

    /// The only kind of payload the round accepts, `None` for final rounds.
    pub payload_kind: Option<PayloadKind<Ctx>>,

    /// Emitted when the round concludes successfully.
    pub done_event: Option<Ctx::AppEvent>,

    /// Computes the new synchronized data on success.
    #[derive_where(skip)]
    pub update: UpdateFn<Ctx>,

    /// Whether this is a reset round, whose deadline is a `RESET_TIMEOUT`.
    pub reset: bool,
}

impl<Ctx: Context> RoundDef<Ctx> {
    /// Define a round collecting payloads of the given kind.
    pub fn new(
        id: Ctx::RoundId,
        quorum: Quorum<Ctx>,
        payload_kind: PayloadKind<Ctx>,
        done_event: Ctx::AppEvent,
        update: UpdateFn<Ctx>,
    ) -> Self {
        Self {
            id,
            quorum,
            payload_kind: Some(payload_kind),
            done_event: Some(done_event),
            update,
            reset: false,
        }
    }

    /// Define a final round.
    pub fn degenerate(id: Ctx::RoundId) -> Self {
        Self {
            id,
            quorum: Quorum::Degenerate,
            payload_kind: None,
            done_event: None,
            update: keep_data,
            reset: false,
        }
    }

    /// Mark this round as a reset round.
    pub fn with_reset(self) -> Self {
        Self {
            reset: true,
            ..self
        }
    }

    pub fn is_final(&self) -> bool {
        self.quorum.is_final()
    }
}
