use std::collections::HashSet;

/// Which voice cluster a persona belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersonaKind {
    Male,
    Female,
}

/// The named identity the upstream model speaks as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    pub kind: PersonaKind,
    pub name: String,
}

/// Maps a requested voice onto a persona.
///
/// Voices in the low-pitch set get the male persona, everything else the female
/// one. Matching is exact, the same way the upstream treats voice names.
#[derive(Debug, Clone)]
pub struct PersonaTable {
    low_pitch_voices: HashSet<String>,
    male_name: String,
    female_name: String,
}

pub const DEFAULT_LOW_PITCH_VOICES: [&str; 3] = ["Charon", "Fenrir", "Puck"];
pub const DEFAULT_MALE_PERSONA: &str = "Rahul";
pub const DEFAULT_FEMALE_PERSONA: &str = "Riya";

impl PersonaTable {
    pub fn new<I, S>(low_pitch_voices: I, male_name: String, female_name: String) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            low_pitch_voices: low_pitch_voices.into_iter().map(Into::into).collect(),
            male_name,
            female_name,
        }
    }

    pub fn is_low_pitch(&self, voice: &str) -> bool {
        self.low_pitch_voices.contains(voice)
    }

    pub fn resolve(&self, voice: &str) -> Persona {
        if self.is_low_pitch(voice) {
            Persona {
                kind: PersonaKind::Male,
                name: self.male_name.clone(),
            }
        } else {
            Persona {
                kind: PersonaKind::Female,
                name: self.female_name.clone(),
            }
        }
    }
}

impl Default for PersonaTable {
    fn default() -> Self {
        Self::new(
            DEFAULT_LOW_PITCH_VOICES,
            DEFAULT_MALE_PERSONA.to_string(),
            DEFAULT_FEMALE_PERSONA.to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_pitch_voices_resolve_to_male_persona() {
        let table = PersonaTable::default();
        for voice in DEFAULT_LOW_PITCH_VOICES {
            let persona = table.resolve(voice);
            assert_eq!(persona.kind, PersonaKind::Male);
            assert_eq!(persona.name, "Rahul");
        }
    }

    #[test]
    fn test_other_voices_resolve_to_female_persona() {
        let table = PersonaTable::default();
        for voice in ["Kore", "Aoede", "puck", "", "Charon "] {
            let persona = table.resolve(voice);
            assert_eq!(persona.kind, PersonaKind::Female, "voice {voice:?}");
            assert_eq!(persona.name, "Riya");
        }
    }

    #[test]
    fn test_custom_table() {
        let table = PersonaTable::new(["Orus"], "Arjun".to_string(), "Meera".to_string());
        assert_eq!(table.resolve("Orus").name, "Arjun");
        assert_eq!(table.resolve("Puck").name, "Meera");
    }
}
