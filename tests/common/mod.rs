#![allow(dead_code)]

/// Twelve paragraphs of five identical 20-word sentences, every one opening
/// with the same transition and carrying three marker words. 1200 words.
pub fn uniform_marker_text() -> String {
    let sentence = "Furthermore, we delve into robust data and leverage new methods to study how cells respond to heat in the lab.";
    let paragraph = vec![sentence; 5].join(" ");
    vec![paragraph; 12].join("\n\n")
}

/// Varied personal prose: sentence lengths from 4 to 42 words, paragraphs of
/// 1, 3, 8 and 2 sentences, contractions, an exclamation and no marker words.
/// Six repetitions of a 198-word block.
pub fn varied_human_text() -> String {
    let block = [
        "I moved here in June.",
        "The rain came early. We didn't have a proper roof on the shed yet so my brother and I spent most of the weekend dragging old tarps across the beams and tying them down with rope. It held until Tuesday night.",
        "Then the wind picked up. My neighbor came over in her boots and asked if we needed help with their old ladder. Nobody wanted to climb it. So we stood there in the mud for a while and argued about whether the posts would hold if the gusts kept coming from the north the way the radio said they would all night long. What a mess it was! The tarps flapped like flags. Around midnight one rope snapped and the whole corner of the sheet folded back over the beam and soaked the firewood we had stacked inside for the winter and left the floor a swamp of sawdust and leaves and bits of bark. I learned a lesson.",
        "Next year we buy metal. The quote from the hardware store came to about 3,000 dollars for the sheets and the screws and the flashing and the delivery to the farm.",
    ]
    .join("\n\n");
    vec![block; 6].join("\n\n")
}

/// 300 words with ten numeric citations: eight in the first 80 words, six of
/// those introduced by a formulaic frame.
pub fn front_loaded_citation_text() -> String {
    let mut parts = Vec::new();
    for i in 0..8 {
        let frame = match i {
            0 | 2 | 4 => "as noted by Smith",
            1 | 3 | 5 => "according to prior work",
            _ => "in our own lab",
        };
        parts.push(format!("{} [{}] plain words go here now", frame, i + 1));
    }
    parts.push(vec!["filler"; 200].join(" "));
    parts.push("in our own lab [9] plain words go here now".to_string());
    parts.push("in our own lab [10] plain words go here now".to_string());
    parts.join(" ")
}
