//! Prompt template for social post generation.

/// Post generation prompt template.
/// Replace: {persona}, {topic}, {tone}, {platform}
pub const POST_PROMPT_TEMPLATE: &str = r#"You are an expert social media manager. Write a social media post from the details below.

- Persona: "{persona}"
- Topic: "{topic}"
- Tone: "{tone}"
- Platform: "{platform}"

Provide three things:
1. A caption that is engaging and informative. Format it with Markdown ('**' for bold text, '-' for bullet points).
2. A detailed, creative prompt for an AI image generator describing a relevant, visually appealing image for this post.
3. A list of 5-7 relevant, popular hashtags for the platform.

Respond with a single minified JSON object with exactly three keys: "caption" (string), "imagePrompt" (string) and "hashtags" (array of strings)."#;
