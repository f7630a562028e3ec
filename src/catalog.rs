//! Static catalog of the scenario, drawable outfits and selectable companions

use crate::model::{
    Companion, CompanionProfile, CompanionStats, Outfit, Percent, RelationshipStatus, Scenario,
};
use reqwest::Url;

const PORTRAIT_SERVICE: &str = "https://image.pollinations.ai/prompt/";

/// Style keywords appended to every portrait prompt so the cast looks consistent
const PORTRAIT_STYLE: &str = ", (korean manhwa style:1.5), (otome game art:1.4), \
(detailed beautiful face:1.5), (semi-realistic:1.4), best quality, 8k, detailed eyes, \
glossy lips, sharp jawline, cinematic lighting";

/// Build the generated-portrait URL for a prompt and a fixed seed
pub fn portrait_url(prompt: &str, seed: u32) -> String {
    let Ok(mut url) = Url::parse(PORTRAIT_SERVICE) else {
        return String::new();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(&format!("{prompt}{PORTRAIT_STYLE}"));
    }
    url.query_pairs_mut()
        .append_pair("nologo", "true")
        .append_pair("width", "720")
        .append_pair("height", "1280")
        .append_pair("seed", &seed.to_string());
    url.into()
}

/// Pure catalog data; never mutated during play
#[derive(Debug, Clone)]
pub struct Catalog {
    pub scenario: Scenario,
    pub outfits: Vec<Outfit>,
    pub companions: Vec<Companion>,
}

impl Catalog {
    /// The catalog shipped with the game
    pub fn builtin() -> Self {
        Self {
            scenario: main_scenario(),
            outfits: outfits(),
            companions: companions(),
        }
    }

    /// Look up a companion in its initial (catalog) condition
    pub fn companion(&self, id: &str) -> Option<&Companion> {
        self.companions.iter().find(|c| c.id() == id)
    }
}

fn main_scenario() -> Scenario {
    Scenario {
        id: "scenario_interstellar".into(),
        title: "Interstellar Beastworld: The Last Pureblood".into(),
        description: "An age of towering technology and collapsing genes. Human women died out \
            long ago; the beastmen wield world-ending power yet are tormented by frenzy. Until \
            one day you, the only pureblood human woman in the universe, crossed over in the flesh."
            .into(),
        world_setting: "Interstellar future. Megacities stand beside primal jungle. Male \
            pregnancy exists through artificial wombs or racial gifts. A pureblood human woman \
            is the most exalted being alive."
            .into(),
        intro_text: "Higher-dimensional lifeform detected... matching plane... coordinates \
            locked: Star Federation... identity generated: sole pureblood human..."
            .into(),
        goal: "In a dangerous world overrun by males, use your talent to build your own court \
            and empire."
            .into(),
    }
}

fn outfits() -> Vec<Outfit> {
    vec![
        Outfit {
            id: "outfit_domination".into(),
            name: "Thorn Crown of the Galactic Empress".into(),
            description: "A black gown condensed from dark matter and stardust, radiating a \
                pressure that makes living genes shudder."
                .into(),
            power_name: "Talent: Absolute Dominion".into(),
            power_effect: "Your words are law. Every beastman before you feels suppression at \
                the level of his genes and must kneel. You are their queen and sole sovereign."
                .into(),
            image: portrait_url(
                "majestic empress concept art, black gothic sci-fi dress, crown of thorns, dark \
                 energy aura, glowing purple eyes, commanding pose, space nebula background",
                101,
            ),
            style: "border-purple-500".into(),
        },
        Outfit {
            id: "outfit_wealth".into(),
            name: "Supreme Scepter of the Star Magnate".into(),
            description: "A nano battle-suit flowing with liquid gold, the symbol of power over \
                every resource in the universe."
                .into(),
            power_name: "Talent: Endless Resources".into(),
            power_effect: "You own enough wealth to buy whole galaxies. Rare energy ore or pure \
                food, a wave of your hand fills a planet with it."
                .into(),
            image: portrait_url(
                "elegant noble woman concept art, golden sci-fi armor suit, jeweled scepter, \
                 floating gold holographic coins, luxury spaceship interior",
                102,
            ),
            style: "border-yellow-400".into(),
        },
        Outfit {
            id: "outfit_charm".into(),
            name: "Pheromones of the Pureblood Eve".into(),
            description: "A simple white silk dress, impossibly alluring, carrying a sweet scent \
                that drives beastmen mad."
                .into(),
            power_name: "Talent: Genetic Riot".into(),
            power_effect: "You are the only cure in the universe and its most violent poison. \
                Your scent soothes a beastman's genetic collapse, or drives rivals into a \
                frenzied courtship battle."
                .into(),
            image: portrait_url(
                "pure innocent beautiful woman concept art, white silk slip dress, soft glowing \
                 light, pheromone mist, flowers in space, ethereal",
                103,
            ),
            style: "border-pink-400".into(),
        },
    ]
}

struct Seed {
    id: &'static str,
    name: &'static str,
    species: &'static str,
    archetype: &'static str,
    appearance: &'static str,
    personality: &'static str,
    obsession: &'static str,
    prompt: &'static str,
    seed: u32,
    favorability: i64,
    stance: RelationshipStatus,
}

impl Seed {
    fn into_companion(self) -> Companion {
        Companion {
            profile: CompanionProfile {
                id: self.id.into(),
                name: self.name.into(),
                species: self.species.into(),
                archetype: self.archetype.into(),
                appearance: self.appearance.into(),
                personality: self.personality.into(),
                obsession: self.obsession.into(),
                image: portrait_url(self.prompt, self.seed),
                stance: self.stance,
            },
            stats: CompanionStats {
                favorability: Percent::new(self.favorability),
                pregnancy: Percent::ZERO,
                relationship: self.stance,
            },
        }
    }
}

#[allow(clippy::too_many_lines)]
fn companions() -> Vec<Companion> {
    [
        Seed {
            id: "ml_snake",
            name: "Zhu Yin",
            species: "Abyssal Black Serpent",
            archetype: "Cold-blooded warlord / clingy warmth-seeker",
            appearance: "Ink-black hair spills over his epaulettes; golden slit pupils hold \
                icy killing intent that melts the moment they turn to you.",
            personality: "Cold outside, clingy inside. The feared fleet commander runs so cold \
                that he starves for touch, and at night he slips into serpent form to beg for a \
                little of your warmth.",
            obsession: "\"Don't push me away... I just want to be a little warmer, only a little...\"",
            prompt: "portrait of handsome anime man, black hair, intense yellow snake eyes, dark \
                military uniform with snake scale texture, snake horns",
            seed: 555,
            favorability: 0,
            stance: RelationshipStatus::Hostile,
        },
        Seed {
            id: "ml_wolf",
            name: "Cang Ya",
            species: "Silver Moon Frost Wolf",
            archetype: "Humble loyal hound / slave bodyguard",
            appearance: "Short silver-grey hair, fluffy wolf ears, a slave's muzzle ring at his \
                throat and a perfectly muscled frame.",
            personality: "Devoted to the point of self-effacement. He thinks himself a lowly \
                half-breed who may not even look up at you, and asks only to kneel below your \
                throne as your sharpest blade.",
            obsession: "\"Master, a dog like me mustn't soil your bed... may I sleep on the rug?\"",
            prompt: "portrait of handsome anime man, silver grey hair, wolf ears, metal slave \
                collar, open white shirt, intense submissive gaze",
            seed: 666,
            favorability: 10,
            stance: RelationshipStatus::Stranger,
        },
        Seed {
            id: "ml_fox",
            name: "Tu Shan",
            species: "Nine-Tailed Celestial Fox",
            archetype: "Imperial chancellor / scheming sweetheart",
            appearance: "Long hair fading from pink to white, eyes always narrowed in a smile, \
                ornate robes, nine phantom tails swaying behind him.",
            personality: "A smiling tiger. Ruthless to other men, helpless and delicate in front \
                of you, wanting you to blow on the smallest scratch.",
            obsession: "\"Oh my, General Cang Ya is so rough. Not like me, I only ever worry about you~\"",
            prompt: "portrait of beautiful anime man, long pink and white hair, fox ears, nine \
                fluffy fox tails, fantasy silk robe, soft smiling expression",
            seed: 777,
            favorability: 5,
            stance: RelationshipStatus::Stranger,
        },
        Seed {
            id: "ml_peacock",
            name: "Xuan Ling",
            species: "Aurora Peacock",
            archetype: "Richest man in the stars / tsundere showpiece",
            appearance: "Dazzling peacock-blue curls, features too perfect to be real, clothes \
                absurdly lavish and covered in gems.",
            personality: "Self-proclaimed most beautiful male in the universe. Sneers at you \
                until your pheromones win him over, then preens around you without end.",
            obsession: "\"Here, have this planet... don't get the wrong idea! It was just taking up space!\"",
            prompt: "portrait of beautiful anime man, cyan blue curly hair, large gemstone rings, \
                finger touching lips, heavy jewelry, arrogant expression",
            seed: 888,
            favorability: 0,
            stance: RelationshipStatus::Hostile,
        },
        Seed {
            id: "ml_spider",
            name: "Morse",
            species: "Starnet Widow Spider",
            archetype: "Darknet kingpin / willing prey",
            appearance: "Black hair, red eyes, gold-rimmed glasses, a refined scoundrel with \
                mechanical spider lances lurking in the shadow at his back.",
            personality: "The madman who runs the universe's dark networks. Being bound, \
                trampled or even devoured by you is the highest thrill he knows.",
            obsession: "\"Your Majesty, please tighten your web... let me suffocate in your palm.\"",
            prompt: "portrait of handsome anime man, black hair, red glowing eyes, gold glasses, \
                white shirt, spider legs from the shadows, villain smile",
            seed: 999,
            favorability: 0,
            stance: RelationshipStatus::Hostile,
        },
        Seed {
            id: "ml_rabbit",
            name: "Cino",
            species: "Lop-Eared White Rabbit",
            archetype: "Mad doctor / sweet outside, dark inside",
            appearance: "Looks like an underage angel with soft lop ears and innocent red eyes, \
                wearing a blood-stained lab coat.",
            personality: "The finest geneticist in the stars. Healing-type cute on the surface, \
                pitch black underneath; he wants to dissect you and to lock you away for himself.",
            obsession: "\"Your genes are perfect... I want to make you a specimen so you'll be mine \
                forever... just kidding~\"",
            prompt: "portrait of cute anime boy, white hair, rabbit ears, red eyes, white lab coat \
                with blood stains, innocent but creepy expression",
            seed: 444,
            favorability: 20,
            stance: RelationshipStatus::Stranger,
        },
    ]
    .into_iter()
    .map(Seed::into_companion)
    .collect()
}
