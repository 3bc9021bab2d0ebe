//! Mood inference from exchange signals.

use solace_core::types::{FaceEmotion, MoodTag, SentimentLabel, StressLabel};

/// Map the signals of one exchange to a mood tag.
///
/// Rules are evaluated in order and the first match wins:
/// 1. risk or elevated stress: `fear` if the face shows fear or sadness, else `sad`
/// 2. very negative sentiment or an angry face: `angry`
/// 3. negative sentiment or a sad face: `sad`
/// 4. a surprised face: `surprise`
/// 5. positive sentiment or a happy face: `happy`
/// 6. otherwise `neutral`
pub fn infer(
    sentiment: SentimentLabel,
    stress: StressLabel,
    risk_flag: bool,
    face: Option<FaceEmotion>,
) -> MoodTag {
    if risk_flag || stress.is_elevated() {
        return match face {
            Some(FaceEmotion::Fear) | Some(FaceEmotion::Sad) => MoodTag::Fear,
            _ => MoodTag::Sad,
        };
    }
    if sentiment == SentimentLabel::VeryNegative || face == Some(FaceEmotion::Angry) {
        return MoodTag::Angry;
    }
    if sentiment == SentimentLabel::Negative || face == Some(FaceEmotion::Sad) {
        return MoodTag::Sad;
    }
    if face == Some(FaceEmotion::Surprise) {
        return MoodTag::Surprise;
    }
    if matches!(
        sentiment,
        SentimentLabel::Positive | SentimentLabel::VeryPositive
    ) || face == Some(FaceEmotion::Happy)
    {
        return MoodTag::Happy;
    }
    MoodTag::Neutral
}
