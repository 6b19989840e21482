use super::models::{Card, CardKind, ResolutionKind, SpecialEffect};

/// The card set shipped with the server, in default deck order.
///
/// Content is data: nothing in the engine matches on these titles or ids, so
/// hosts can replace the whole set with custom entries without touching code.
pub fn builtin_cards() -> Vec<Card> {
    vec![
        // Forfeits
        Card::new(
            "take-two",
            CardKind::Forfeit,
            "Take Two",
            "Take 2 sips.",
            ResolutionKind::None,
        ),
        Card::new(
            "social",
            CardKind::Forfeit,
            "Social",
            "Everyone takes a sip together.",
            ResolutionKind::None,
        ),
        Card::new(
            "bottoms-up",
            CardKind::Forfeit,
            "Bottoms Up",
            "Finish your drink.",
            ResolutionKind::None,
        ),
        Card::new(
            "share-the-love",
            CardKind::Forfeit,
            "Share the Love",
            "Give 3 sips to a player of your choice.",
            ResolutionKind::Target,
        ),
        Card::new(
            "nominate",
            CardKind::Forfeit,
            "Nominate",
            "Choose a player to take a sip.",
            ResolutionKind::Target,
        ),
        Card::new(
            "double-trouble",
            CardKind::Forfeit,
            "Double Trouble",
            "Pick two players. Give 2 sips to each of them.",
            ResolutionKind::TwoTargets,
        ),
        Card::new(
            "lucky-number",
            CardKind::Forfeit,
            "Lucky Number",
            "Call a number up to 6 and take that many sips.",
            ResolutionKind::Count,
        ),
        Card::new(
            "dealers-choice",
            CardKind::Forfeit,
            "Dealer's Choice",
            "Pick a player and a number up to 5. Give them that many sips.",
            ResolutionKind::TargetCount,
        ),
        Card::new(
            "story-time",
            CardKind::Forfeit,
            "Story Time",
            "Tell a story about the player to your left. The table may discuss and embellish.",
            ResolutionKind::None,
        ),
        // Rules
        Card::new(
            "house-rule",
            CardKind::Rule,
            "House Rule",
            "Invent a rule everyone must follow. Breaking it costs a sip.",
            ResolutionKind::RuleText,
        ),
        Card::new(
            "thumb-master",
            CardKind::Rule,
            "Thumb Master",
            "When the drawer puts a thumb on the table, everyone follows. Last one drinks.",
            ResolutionKind::None,
        ),
        Card::new(
            "no-names",
            CardKind::Rule,
            "No Names",
            "Nobody may say another player's name. Slip up and take a sip.",
            ResolutionKind::None,
        ),
        Card::new(
            "clean-slate",
            CardKind::Rule,
            "Clean Slate",
            "Every standing rule is wiped from the table.",
            ResolutionKind::None,
        )
        .with_special(SpecialEffect::ClearRules),
        // Roles
        Card::new(
            "question-master",
            CardKind::Role,
            "Question Master",
            "Pick a player. Anyone who answers their questions takes a sip.",
            ResolutionKind::Target,
        ),
        Card::new(
            "booth-dj",
            CardKind::Role,
            "Booth DJ",
            "Pick a player. They control the music until someone takes the role.",
            ResolutionKind::Target,
        ),
        Card::new(
            "abdication",
            CardKind::Role,
            "Abdication",
            "Every role is surrendered immediately.",
            ResolutionKind::None,
        )
        .with_special(SpecialEffect::ClearRoles),
        // Curses
        Card::new(
            "third-person",
            CardKind::Curse,
            "Third Person",
            "Pick a player. They must speak about themselves in the third person.",
            ResolutionKind::Target,
        ),
        Card::new(
            "t-rex-arms",
            CardKind::Curse,
            "T-Rex Arms",
            "Pick a player. Their elbows stay glued to their sides.",
            ResolutionKind::Target,
        ),
        Card::new(
            "holy-water",
            CardKind::Curse,
            "Holy Water",
            "Lift a curse from any player.",
            ResolutionKind::Target,
        )
        .with_special(SpecialEffect::LiftCurse),
        Card::new(
            "curse-swap",
            CardKind::Curse,
            "Curse Swap",
            "Move a curse from one player onto another.",
            ResolutionKind::TwoTargets,
        )
        .with_special(SpecialEffect::TransferCurse),
        // Events
        Card::new(
            "happy-hour",
            CardKind::Event,
            "Happy Hour",
            "All handed-out sips count double until the next event card.",
            ResolutionKind::None,
        ),
        Card::new(
            "silent-round",
            CardKind::Event,
            "Silent Round",
            "No talking until the next card is drawn. Talkers take a sip.",
            ResolutionKind::None,
        ),
        // Joker
        Card::new(
            "wildcard",
            CardKind::Joker,
            "Wildcard",
            "The drawer invents a dare for the whole table.",
            ResolutionKind::None,
        ),
        // Interactive
        Card::new(
            "showdown",
            CardKind::Duel,
            "Showdown",
            "Challenge a player to rock, paper, scissors. The loser takes a sip.",
            ResolutionKind::DuelChallenge,
        ),
        Card::new(
            "majority-rules",
            CardKind::Vote,
            "Majority Rules",
            "The room votes on the drawer's question. The minority side takes a sip.",
            ResolutionKind::GroupVote,
        ),
        Card::new(
            "court-of-opinion",
            CardKind::Vote,
            "Court of Opinion",
            "Put a this-or-that to the room. Losing side takes a sip.",
            ResolutionKind::GroupVote,
        ),
    ]
}
