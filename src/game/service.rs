use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::catalog::{Card, CardCatalog, ResolutionKind};
use crate::event::EventBus;
use crate::game::deck::{self, WeightedCandidate};
use crate::game::resolve::{self, ResolutionInput};
use crate::game::{acks, interaction, timer, turn};
use crate::room::models::{CurrentDraw, DrawMode, DuelChoice, Interaction, VoteSide};
use crate::room::registry::RoomRegistry;
use crate::shared::GameError;
use crate::websockets::messages::ServerMessage;

/// Service for gameplay actions inside a live room: drawing, resolving,
/// confirmations, duels, votes and nudges.
///
/// Every method locks the target room for its whole critical section, so an
/// action is applied atomically and broadcasts observe a consistent state.
pub struct GameService {
    registry: Arc<RoomRegistry>,
    catalog: Arc<CardCatalog>,
    event_bus: EventBus,
}

impl GameService {
    pub fn new(registry: Arc<RoomRegistry>, catalog: Arc<CardCatalog>, event_bus: EventBus) -> Self {
        Self {
            registry,
            catalog,
            event_bus,
        }
    }

    /// Draws the next card for the turn holder.
    ///
    /// Selection happens before any commit: a picked id that fails catalog
    /// lookup returns `CardNotFound` with the cursor and discard untouched.
    #[instrument(skip(self))]
    pub async fn draw(&self, room_code: &str, player_id: &str) -> Result<Card, GameError> {
        let shared = self
            .registry
            .get(room_code)
            .await
            .ok_or(GameError::RoomNotFound)?;
        let mut room = shared.lock().await;

        turn::assert_turn_holder(&room, player_id)?;
        if room.interaction.is_some() {
            return Err(GameError::InteractionActive);
        }
        if room.current_draw.is_some() {
            return Err(GameError::UnresolvedCard);
        }

        let order = room.deck.order().to_vec();
        if order.is_empty() {
            return Err(GameError::EmptyDeck);
        }

        let picked = match room.settings.draw_mode {
            DrawMode::Sequential => {
                deck::peek_sequential(&room.deck).ok_or(GameError::EmptyDeck)?
            }
            DrawMode::Weighted => {
                let candidates: Vec<WeightedCandidate> = self
                    .catalog
                    .kinds_of(&order)
                    .await
                    .into_iter()
                    .map(|(id, kind)| WeightedCandidate { id, kind })
                    .collect();
                let recent_ids = deck::recent_discards(&room.discard).to_vec();
                let recent = self.catalog.kinds_of(&recent_ids).await;
                let safe_mode = room.settings.safe_mode;
                let picked = {
                    let mut rng = rand::rng();
                    deck::draw_weighted(&mut rng, &candidates, &recent, safe_mode)
                };
                picked.ok_or(GameError::EmptyDeck)?
            }
        };

        let card = self
            .catalog
            .get(&picked)
            .await
            .ok_or(GameError::CardNotFound)?;

        let now = Utc::now();
        if room.settings.draw_mode == DrawMode::Sequential {
            deck::commit_sequential(&mut room.deck);
        }
        room.discard.push(card.id.clone());
        room.current_draw = Some(CurrentDraw {
            card_id: card.id.clone(),
            drawer_id: player_id.to_string(),
            drawn_at: now,
        });
        room.turn_timer = if room.settings.turn_timer {
            Some(timer::timer_for_card(&card, now))
        } else {
            None
        };
        room.nudged_for = None;
        let drawer = room.player_name(player_id);
        room.push_log(now, format!("{drawer} drew {}", card.title));
        room.touch(now);
        let snapshot = room.snapshot();
        drop(room);

        self.event_bus
            .publish_to_room(
                room_code,
                ServerMessage::CardDrawn {
                    card: card.clone(),
                    drawer_id: player_id.to_string(),
                },
            )
            .await;
        self.event_bus
            .publish_to_room(room_code, ServerMessage::RoomState { room: snapshot })
            .await;

        info!(room_code = %room_code, card_id = %card.id, "Card drawn");
        Ok(card)
    }

    /// Resolves the current draw with the drawer's input.
    ///
    /// Interactive cards are redirected into a duel or vote instead of
    /// resolving immediately; everything else applies its effect and the
    /// turn advances.
    #[instrument(skip(self, input))]
    pub async fn resolve(
        &self,
        room_code: &str,
        player_id: &str,
        card_id: &str,
        input: &ResolutionInput,
    ) -> Result<String, GameError> {
        let shared = self
            .registry
            .get(room_code)
            .await
            .ok_or(GameError::RoomNotFound)?;
        let mut room = shared.lock().await;

        let draw = room.current_draw.clone().ok_or(GameError::NoActiveDraw)?;
        if draw.drawer_id != player_id {
            return Err(GameError::NotDrawer);
        }
        if draw.card_id != card_id {
            return Err(GameError::CardMismatch);
        }
        let card = self
            .catalog
            .get(card_id)
            .await
            .ok_or(GameError::CardNotFound)?;

        let now = Utc::now();
        match card.resolution {
            ResolutionKind::DuelChallenge => {
                let ResolutionInput::DuelChallenge { opponent } = input else {
                    return Err(GameError::MissingTarget);
                };
                if opponent.is_empty() {
                    return Err(GameError::MissingTarget);
                }
                let valid_opponent = room
                    .player(opponent)
                    .map(|p| p.is_active() && p.id != player_id)
                    .unwrap_or(false);
                if !valid_opponent {
                    return Err(GameError::InvalidTarget);
                }

                room.interaction =
                    Some(interaction::start_duel(&card.id, player_id, opponent, now));
                room.clear_draw();
                let challenger = room.player_name(player_id);
                let challenged = room.player_name(opponent);
                let message = format!("{challenger} challenged {challenged} to a duel");
                room.push_log(now, message.clone());
                room.touch(now);
                let snapshot = room.snapshot();
                drop(room);

                if let Some(view) = snapshot.interaction.clone() {
                    self.event_bus
                        .publish_to_room(
                            room_code,
                            ServerMessage::InteractionStarted { interaction: view },
                        )
                        .await;
                }
                self.event_bus
                    .publish_to_room(room_code, ServerMessage::RoomState { room: snapshot })
                    .await;
                info!(room_code = %room_code, card_id = %card.id, "Duel started");
                Ok(message)
            }
            ResolutionKind::GroupVote => {
                room.interaction = Some(interaction::start_vote(&card, player_id, now));
                room.clear_draw();
                let starter = room.player_name(player_id);
                let message = format!("{starter} called a vote: {}", card.text);
                room.push_log(now, message.clone());
                room.touch(now);
                let snapshot = room.snapshot();
                drop(room);

                if let Some(view) = snapshot.interaction.clone() {
                    self.event_bus
                        .publish_to_room(
                            room_code,
                            ServerMessage::InteractionStarted { interaction: view },
                        )
                        .await;
                }
                self.event_bus
                    .publish_to_room(room_code, ServerMessage::RoomState { room: snapshot })
                    .await;
                info!(room_code = %room_code, card_id = %card.id, "Group vote started");
                Ok(message)
            }
            _ => {
                let outcome = resolve::resolve_card(&mut room, &card, player_id, input)?;
                room.clear_draw();
                turn::advance_turn(&mut room);
                room.touch(now);
                let next_player = turn::current_turn_player(&room).map(|p| p.id.clone());
                let snapshot = room.snapshot();
                drop(room);

                self.event_bus
                    .publish_to_room(
                        room_code,
                        ServerMessage::EffectApplied {
                            card_id: card.id.clone(),
                            message: outcome.message.clone(),
                        },
                    )
                    .await;
                self.event_bus
                    .publish_to_room(
                        room_code,
                        ServerMessage::TurnChanged {
                            player_id: next_player,
                        },
                    )
                    .await;
                self.event_bus
                    .publish_to_room(room_code, ServerMessage::RoomState { room: snapshot })
                    .await;
                info!(room_code = %room_code, card_id = %card.id, "Card resolved");
                Ok(outcome.message)
            }
        }
    }

    /// Confirms a pending receipt. Replays succeed quietly.
    #[instrument(skip(self))]
    pub async fn confirm_ack(
        &self,
        room_code: &str,
        player_id: &str,
        ack_id: &str,
    ) -> Result<(), GameError> {
        let shared = self
            .registry
            .get(room_code)
            .await
            .ok_or(GameError::RoomNotFound)?;
        let mut room = shared.lock().await;

        match acks::confirm(&mut room, ack_id, player_id)? {
            acks::AckConfirmOutcome::Confirmed(ack) => {
                let now = Utc::now();
                let name = room.player_name(player_id);
                room.push_log(now, format!("{name} confirmed {}", ack.card_title));
                room.touch(now);
                let snapshot = room.snapshot();
                drop(room);

                self.event_bus
                    .publish_to_room(
                        room_code,
                        ServerMessage::AckConfirmed {
                            ack_id: ack_id.to_string(),
                            player_id: player_id.to_string(),
                        },
                    )
                    .await;
                self.event_bus
                    .publish_to_room(room_code, ServerMessage::RoomState { room: snapshot })
                    .await;
            }
            acks::AckConfirmOutcome::AlreadyConfirmed => {}
        }
        Ok(())
    }

    /// Records a duel pick, overwriting a resubmission, and resolves as soon
    /// as both picks are in.
    #[instrument(skip(self))]
    pub async fn duel_choose(
        &self,
        room_code: &str,
        player_id: &str,
        choice: DuelChoice,
    ) -> Result<(), GameError> {
        let shared = self
            .registry
            .get(room_code)
            .await
            .ok_or(GameError::RoomNotFound)?;
        let mut room = shared.lock().await;

        let duel_state = match room.interaction.as_mut() {
            Some(Interaction::Duel(duel)) => {
                if duel.challenger != player_id && duel.opponent != player_id {
                    return Err(GameError::NotInDuel);
                }
                duel.choices.insert(player_id.to_string(), choice);
                duel.clone()
            }
            _ => return Err(GameError::NoInteraction),
        };
        let now = Utc::now();
        room.touch(now);

        if let Some(outcome) = interaction::try_resolve_duel(&room, &duel_state) {
            interaction::apply_interaction_outcome(&mut room, &outcome);
            let next_player = turn::current_turn_player(&room).map(|p| p.id.clone());
            let snapshot = room.snapshot();
            drop(room);

            self.event_bus
                .publish_to_room(
                    room_code,
                    ServerMessage::InteractionResolved {
                        message: outcome.message.clone(),
                    },
                )
                .await;
            self.event_bus
                .publish_to_room(
                    room_code,
                    ServerMessage::TurnChanged {
                        player_id: next_player,
                    },
                )
                .await;
            self.event_bus
                .publish_to_room(room_code, ServerMessage::RoomState { room: snapshot })
                .await;
            info!(room_code = %room_code, "Duel resolved");
        } else {
            let snapshot = room.snapshot();
            drop(room);
            self.event_bus
                .publish_to_room(room_code, ServerMessage::RoomState { room: snapshot })
                .await;
        }
        Ok(())
    }

    /// Records a vote, overwriting a resubmission, and resolves once every
    /// active player has voted.
    #[instrument(skip(self))]
    pub async fn vote_cast(
        &self,
        room_code: &str,
        player_id: &str,
        side: VoteSide,
    ) -> Result<(), GameError> {
        let shared = self
            .registry
            .get(room_code)
            .await
            .ok_or(GameError::RoomNotFound)?;
        let mut room = shared.lock().await;

        if !matches!(room.interaction, Some(Interaction::GroupVote(_))) {
            return Err(GameError::NoInteraction);
        }
        match room.player(player_id) {
            None => return Err(GameError::PlayerNotFound),
            Some(p) if !p.is_active() => return Err(GameError::SpectatorsCannotVote),
            Some(_) => {}
        }
        let vote_state = match room.interaction.as_mut() {
            Some(Interaction::GroupVote(vote)) => {
                vote.votes.insert(player_id.to_string(), side);
                vote.clone()
            }
            _ => return Err(GameError::NoInteraction),
        };
        let now = Utc::now();
        room.touch(now);

        if let Some(outcome) = interaction::try_resolve_vote(&room, &vote_state) {
            interaction::apply_interaction_outcome(&mut room, &outcome);
            let next_player = turn::current_turn_player(&room).map(|p| p.id.clone());
            let snapshot = room.snapshot();
            drop(room);

            self.event_bus
                .publish_to_room(
                    room_code,
                    ServerMessage::InteractionResolved {
                        message: outcome.message.clone(),
                    },
                )
                .await;
            self.event_bus
                .publish_to_room(
                    room_code,
                    ServerMessage::TurnChanged {
                        player_id: next_player,
                    },
                )
                .await;
            self.event_bus
                .publish_to_room(room_code, ServerMessage::RoomState { room: snapshot })
                .await;
            info!(room_code = %room_code, "Group vote resolved");
        } else {
            let snapshot = room.snapshot();
            drop(room);
            self.event_bus
                .publish_to_room(room_code, ServerMessage::RoomState { room: snapshot })
                .await;
        }
        Ok(())
    }

    /// Player-to-player nudge; a broadcast poke, no state change.
    #[instrument(skip(self))]
    pub async fn nudge(
        &self,
        room_code: &str,
        from_id: &str,
        to_id: &str,
    ) -> Result<(), GameError> {
        let shared = self
            .registry
            .get(room_code)
            .await
            .ok_or(GameError::RoomNotFound)?;
        {
            let mut room = shared.lock().await;
            if room.player(from_id).is_none() || room.player(to_id).is_none() {
                return Err(GameError::PlayerNotFound);
            }
            room.touch(Utc::now());
        }

        self.event_bus
            .publish_to_room(
                room_code,
                ServerMessage::PlayerNudged {
                    from: Some(from_id.to_string()),
                    to: to_id.to_string(),
                },
            )
            .await;
        Ok(())
    }
}
