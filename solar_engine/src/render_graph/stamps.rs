/// Frame stamps written by each bloom pass
///
/// Every offscreen pass records the frame number it rendered. Before the
/// composite pass reads them, all four inputs must carry the frame being
/// recorded, so the composite never mixes content from different frames.

use crate::error::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStamps {
    pub glow: Option<u64>,
    pub blur_vertical: Option<u64>,
    pub blur_horizontal: Option<u64>,
    pub scene: Option<u64>,
    pub composite: Option<u64>,
}

impl PassStamps {
    /// Check that every composite input was produced for `frame`
    pub fn verify_composite_inputs(&self, frame: u64) -> Result<()> {
        let inputs = [
            ("glow", self.glow),
            ("blur_vertical", self.blur_vertical),
            ("blur_horizontal", self.blur_horizontal),
            ("scene", self.scene),
        ];
        for (pass, stamp) in inputs {
            if stamp != Some(frame) {
                crate::engine_bail!("solar3d::graph",
                    "composite of frame {} would read '{}' from frame {:?}", frame, pass, stamp);
            }
        }
        Ok(())
    }
}
