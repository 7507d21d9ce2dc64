//! Field-contract declarations per workflow.
//!
//! Each entry lists the per-field rules an endpoint enforces before
//! document-schema validation runs. Declaration order is evaluation order,
//! which keeps the aggregated error set deterministic.

use super::{Contract, FieldRule};

const HEX_40: &str = r"^(0x)?[0-9a-fA-F]{40}$";
const HEX_128: &str = r"^(0x)?[0-9a-fA-F]{128}$";

pub(super) const CONTRACTS: &[(&str, &[Contract])] = &[
    // Identity
    (
        "identity-register",
        &[
            Contract { field: "username", rules: &[FieldRule::NonEmptyString], optional: false },
            Contract {
                field: "publicKey",
                rules: &[FieldRule::NonEmptyString, FieldRule::Pattern(HEX_40)],
                optional: false,
            },
        ],
    ),
    (
        "identity-authenticate",
        &[
            Contract { field: "username", rules: &[FieldRule::NonEmptyString], optional: false },
            Contract {
                field: "signature",
                rules: &[FieldRule::NonEmptyString, FieldRule::Pattern(HEX_128)],
                optional: false,
            },
        ],
    ),
    (
        "identity-updateProfile",
        &[
            Contract { field: "username", rules: &[FieldRule::NonEmptyString], optional: false },
            Contract { field: "profileData", rules: &[FieldRule::Object], optional: false },
        ],
    ),
    // Oracle
    (
        "oracle-submitData",
        &[
            Contract { field: "data", rules: &[FieldRule::NonEmptyString], optional: false },
            Contract {
                field: "signature",
                rules: &[FieldRule::NonEmptyString, FieldRule::Pattern(HEX_128)],
                optional: false,
            },
        ],
    ),
    (
        "oracle-validateData",
        &[Contract { field: "dataId", rules: &[FieldRule::NonEmptyString, FieldRule::Uuid], optional: false }],
    ),
    (
        "oracle-updateData",
        &[
            Contract { field: "dataId", rules: &[FieldRule::NonEmptyString, FieldRule::Uuid], optional: false },
            Contract { field: "data", rules: &[FieldRule::NonEmptyString], optional: false },
        ],
    ),
    (
        "oracle-rewards",
        &[Contract { field: "dataId", rules: &[FieldRule::NonEmptyString, FieldRule::Uuid], optional: false }],
    ),
    // Casino
    (
        "casino-createGame",
        &[Contract {
            field: "gameType",
            rules: &[FieldRule::NonEmptyString, FieldRule::OneOf(&["slot", "poker", "roulette"])],
            optional: false,
        }],
    ),
    (
        "casino-play",
        &[
            Contract { field: "gameId", rules: &[FieldRule::NonEmptyString, FieldRule::Uuid], optional: false },
            Contract { field: "wager", rules: &[FieldRule::Numeric { min: Some(0.0) }], optional: false },
        ],
    ),
    (
        "casino-resolveGame",
        &[Contract { field: "gameId", rules: &[FieldRule::NonEmptyString, FieldRule::Uuid], optional: false }],
    ),
    (
        "casino-updateGame",
        &[
            Contract { field: "gameId", rules: &[FieldRule::NonEmptyString, FieldRule::Uuid], optional: false },
            Contract { field: "updates", rules: &[FieldRule::Object], optional: false },
        ],
    ),
    // Market
    (
        "market-create",
        &[
            Contract { field: "title", rules: &[FieldRule::NonEmptyString], optional: false },
            Contract { field: "market.allowUserListings", rules: &[FieldRule::Boolean], optional: false },
            Contract { field: "market.karmaWage", rules: &[FieldRule::Numeric { min: Some(0.0) }], optional: false },
        ],
    ),
    (
        "market-offer",
        &[
            Contract { field: "agent", rules: &[FieldRule::NonEmptyString], optional: false },
            Contract { field: "soulboundId", rules: &[FieldRule::NonEmptyString], optional: false },
            Contract { field: "title", rules: &[FieldRule::NonEmptyString], optional: false },
            Contract { field: "price", rules: &[FieldRule::Numeric { min: Some(0.0) }], optional: false },
            Contract {
                field: "currency",
                rules: &[FieldRule::NonEmptyString, FieldRule::OneOf(&["USD", "ETH", "BTC"])],
                optional: false,
            },
            Contract { field: "expiry", rules: &[FieldRule::Iso8601], optional: false },
        ],
    ),
    (
        "market-verifyOffer",
        &[Contract { field: "offerId", rules: &[FieldRule::NonEmptyString, FieldRule::Uuid], optional: false }],
    ),
    (
        "market-purchaseOffer",
        &[
            Contract { field: "offerId", rules: &[FieldRule::NonEmptyString, FieldRule::Uuid], optional: false },
            Contract { field: "buyerId", rules: &[FieldRule::NonEmptyString], optional: false },
            Contract { field: "buyerSoulboundId", rules: &[FieldRule::NonEmptyString], optional: false },
        ],
    ),
    ("market-checkExpiredOffers", &[]),
    // Feed
    (
        "feed-publish",
        &[
            Contract { field: "channel", rules: &[FieldRule::NonEmptyString], optional: false },
            Contract { field: "payload.content", rules: &[FieldRule::NonEmptyString], optional: false },
            Contract { field: "payload.metadata", rules: &[FieldRule::Object], optional: true },
        ],
    ),
    (
        "feed-comment",
        &[
            Contract { field: "postId", rules: &[FieldRule::NonEmptyString, FieldRule::Uuid], optional: false },
            Contract { field: "comment", rules: &[FieldRule::NonEmptyString], optional: false },
        ],
    ),
    (
        "feed-react",
        &[
            Contract { field: "postId", rules: &[FieldRule::NonEmptyString, FieldRule::Uuid], optional: false },
            Contract {
                field: "reaction",
                rules: &[FieldRule::NonEmptyString, FieldRule::OneOf(&["like", "love", "dislike", "share"])],
                optional: false,
            },
        ],
    ),
    (
        "feed-updatePost",
        &[
            Contract { field: "postId", rules: &[FieldRule::NonEmptyString, FieldRule::Uuid], optional: false },
            Contract { field: "updates.content", rules: &[FieldRule::NonEmptyString], optional: true },
            Contract { field: "updates.metadata", rules: &[FieldRule::Object], optional: true },
        ],
    ),
    // Ritual
    (
        "ritual-initiate",
        &[
            Contract { field: "ritualType", rules: &[FieldRule::NonEmptyString], optional: false },
            Contract { field: "participants", rules: &[FieldRule::Array { min_len: 1 }], optional: false },
        ],
    ),
    // ritual-execute is served by the ritual step interpreter, which applies
    // the ritual document schema instead of field contracts.
    (
        "ritual-complete",
        &[Contract { field: "ritualId", rules: &[FieldRule::NonEmptyString, FieldRule::Uuid], optional: false }],
    ),
    (
        "ritual-updateStatus",
        &[
            Contract { field: "ritualId", rules: &[FieldRule::NonEmptyString, FieldRule::Uuid], optional: false },
            Contract { field: "status", rules: &[FieldRule::NonEmptyString], optional: false },
        ],
    ),
    // Governance
    (
        "governance-propose",
        &[Contract { field: "proposal", rules: &[FieldRule::Object], optional: false }],
    ),
    (
        "governance-vote",
        &[
            Contract { field: "proposalId", rules: &[FieldRule::NonEmptyString, FieldRule::Uuid], optional: false },
            Contract {
                field: "vote",
                rules: &[FieldRule::NonEmptyString, FieldRule::OneOf(&["yes", "no", "abstain"])],
                optional: false,
            },
        ],
    ),
    (
        "governance-execute",
        &[Contract { field: "proposalId", rules: &[FieldRule::NonEmptyString, FieldRule::Uuid], optional: false }],
    ),
    (
        "governance-updateProposal",
        &[
            Contract { field: "proposalId", rules: &[FieldRule::NonEmptyString, FieldRule::Uuid], optional: false },
            Contract { field: "updates", rules: &[FieldRule::Object], optional: false },
        ],
    ),
];
