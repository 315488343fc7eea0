use crate::game::zones::Cards;
use crate::rng::GameRng;
use crate::simulation::pilot::Pilot;

/// Deals opening hands until the pilot keeps one.
///
/// Every attempt reshuffles the whole deck and draws `draw` cards; each
/// rejected hand counts one mulligan. Once the mulligans reach `draw` there
/// is nothing left to bottom, so that hand is kept without asking.
pub fn select_opening_hand<P: Pilot>(pilot: &mut P, deck: &Cards, draw: usize, rng: &mut GameRng) {
    loop {
        let mut library = deck.clone();
        library.shuffle(rng);
        let hand = library.take_top(draw);

        let forced = pilot.game().mulligans() as usize >= draw;
        if forced || pilot.keep_hand(&hand) {
            pilot.game_mut().keep_hand_and_start(library, hand);
            return;
        }
        pilot.game_mut().reject_hand(&hand);
    }
}
