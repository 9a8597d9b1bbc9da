use serde::Serialize;

/// Dominant facial expression of one face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
    Contempt,
}

impl EmotionLabel {
    pub const ALL: [EmotionLabel; 8] = [
        EmotionLabel::Angry,
        EmotionLabel::Disgust,
        EmotionLabel::Fear,
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Surprise,
        EmotionLabel::Neutral,
        EmotionLabel::Contempt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Angry => "angry",
            EmotionLabel::Disgust => "disgust",
            EmotionLabel::Fear => "fear",
            EmotionLabel::Happy => "happy",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Surprise => "surprise",
            EmotionLabel::Neutral => "neutral",
            EmotionLabel::Contempt => "contempt",
        }
    }
}

impl std::fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(EmotionLabel::Angry, "angry")]
    #[case(EmotionLabel::Happy, "happy")]
    #[case(EmotionLabel::Surprise, "surprise")]
    #[case(EmotionLabel::Contempt, "contempt")]
    fn test_serializes_lowercase(#[case] label: EmotionLabel, #[case] expected: &str) {
        assert_eq!(
            serde_json::to_string(&label).unwrap(),
            format!("\"{expected}\"")
        );
        assert_eq!(label.to_string(), expected);
    }

    #[test]
    fn test_display_matches_serde_for_all() {
        for label in EmotionLabel::ALL {
            let json = serde_json::to_value(label).unwrap();
            assert_eq!(json.as_str(), Some(label.as_str()));
        }
    }
}
