//! Wire format of the assistant's message bus.
//!
//! Every frame on the bus is a JSON object carrying a message `type`, a free-form `data`
//! payload and a `context` object that the host uses for routing replies.

use core::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A single message on the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub context: Map<String, Value>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Map<String, Value>, D::Error> {
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Message {
    /// Creates a message. A `data` value that is not a JSON object is replaced by an empty payload.
    pub fn new(msg_type: impl Into<String>, data: Value) -> Self {
        let data = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            msg_type: msg_type.into(),
            data,
            context: Map::new(),
        }
    }

    /// Builds the `speak` request the audio service turns into synthesized speech.
    pub fn speak(utterance: impl Into<String>, meta: Value) -> Self {
        Self::new(
            Topic::Speak.as_str(),
            serde_json::json!({
                "utterance": utterance.into(),
                "expect_response": false,
                "meta": meta,
            }),
        )
    }

    /// Adds a routing entry to the message context.
    #[must_use]
    pub fn with_context(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_owned(), value.into());
        self
    }

    /// Returns a string field of the payload, if present.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Parses a text frame received from the bus.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Serializes the message into a text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// Macro to define the enum from variant => string mappings
macro_rules! define_enum_with_str {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $str:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant,
            )*
        }

        impl $name {
            /// Every known variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant,)*];

            /// The message type string used on the bus.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $str,)*
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ();

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($str => Ok($name::$variant),)*
                    _ => Err(()),
                }
            }
        }
    };
}

define_enum_with_str! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Well-known message types exchanged with the host.
    pub enum Topic {
        /// The wake word was detected and recording starts.
        Wakeword => "recognizer_loop:wakeword",
        /// Recording of the utterance ended.
        RecordEnd => "recognizer_loop:record_end",
        /// Speech-to-text produced nothing usable.
        SpeechUnknown => "mycroft.speech.recognition.unknown",
        /// All skills are loaded and the device is ready.
        Ready => "mycroft.ready",
        /// A skill handler started running.
        HandlerStart => "mycroft.skill.handler.start",
        /// A skill handler finished running.
        HandlerComplete => "mycroft.skill.handler.complete",
        /// Text-to-speech playback started.
        AudioOutputStart => "recognizer_loop:audio_output_start",
        /// Text-to-speech playback ended.
        AudioOutputEnd => "recognizer_loop:audio_output_end",
        /// The device was asked to power off.
        SystemShutdown => "system.shutdown",
        /// The device was asked to restart.
        SystemReboot => "system.reboot",
        /// Skill settings were changed remotely.
        SettingsChanged => "mycroft.skills.settings.changed",
        /// Request to speak an utterance.
        Speak => "speak",
        /// Registers an intent file with the intent parser.
        RegisterIntent => "padatious:register_intent",
    }
}
