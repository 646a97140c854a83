use crate::model::Atlas;

/// Build a Cocos2d-style (format 2) Apple plist with frames keyed by name.
///
/// `texture_file_name` is written to `metadata.textureFileName` so engines can
/// locate the atlas image next to the manifest.
pub fn to_plist<K: ToString>(atlas: &Atlas<K>, texture_file_name: &str) -> String {
    let mut s = String::new();
    s.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
  <key>frames</key>
  <dict>
"#);
    for fr in &atlas.frames {
        // offset is measured from the source center, y pointing up
        let (sw, sh) = (fr.source_size.0 as i64, fr.source_size.1 as i64);
        let cx = fr.source.x as i64 * 2 + fr.source.w as i64 - sw;
        let cy = sh - (fr.source.y as i64 * 2 + fr.source.h as i64);
        s.push_str(&format!(
            "    <key>{}</key>\n    <dict>\n      <key>frame</key><string>{{{{{},{}}},{{{},{}}}}}</string>\n      <key>offset</key><string>{{{},{}}}</string>\n      <key>rotated</key><{} />\n      <key>sourceColorRect</key><string>{{{{{},{}}},{{{},{}}}}}</string>\n      <key>sourceSize</key><string>{{{},{}}}</string>\n    </dict>\n",
            xml_escape(&fr.key.to_string()),
            fr.frame.x, fr.frame.y, fr.source.w, fr.source.h,
            fmt_half(cx), fmt_half(cy),
            if fr.rotated { "true" } else { "false" },
            fr.source.x, fr.source.y, fr.source.w, fr.source.h,
            fr.source_size.0, fr.source_size.1,
        ));
    }
    s.push_str("  </dict>\n");
    s.push_str("  <key>metadata</key>\n  <dict>\n");
    s.push_str(&format!(
        "    <key>format</key><integer>2</integer>\n    <key>pixelFormat</key><string>{}</string>\n    <key>size</key><string>{{{},{}}}</string>\n    <key>textureFileName</key><string>{}</string>\n    <key>realTextureFileName</key><string>{}</string>\n",
        xml_escape(&atlas.meta.format),
        atlas.width, atlas.height,
        xml_escape(texture_file_name),
        xml_escape(texture_file_name),
    ));
    s.push_str("  </dict>\n</dict>\n</plist>\n");
    s
}

/// `v / 2` without a trailing `.0` for whole numbers.
fn fmt_half(v: i64) -> String {
    if v % 2 == 0 {
        format!("{}", v / 2)
    } else {
        format!("{:.1}", v as f64 / 2.0)
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
