// src/manifest.rs

//! Package descriptor (extension.vsixmanifest) synthesis.
//!
//! The descriptor is the XML document the gallery reads from the archive
//! root. It is a pure function of the extension metadata: rendering the
//! same metadata twice yields byte-identical text. Asset paths here must
//! match the staging tree layout exactly, since the gallery resolves them
//! against the archive's internal paths.

use crate::metadata::ExtensionMetadata;
use quick_xml::escape::escape;

/// Entry name of the package descriptor at the archive root.
pub const MANIFEST_ENTRY: &str = "extension.vsixmanifest";

const VSX_SCHEMA: &str = "http://schemas.microsoft.com/developer/vsx-schema/2011";
const VSX_DESIGN_SCHEMA: &str = "http://schemas.microsoft.com/developer/vsx-schema-design/2011";

/// Render the package descriptor for the given metadata.
///
/// Keywords join into a comma-separated `<Tags>` value; absent optional
/// fields render empty rather than failing. Categories are emitted only
/// when declared.
pub fn render(metadata: &ExtensionMetadata) -> String {
    let categories = if metadata.categories.is_empty() {
        String::new()
    } else {
        format!(
            "    <Categories>{}</Categories>\n",
            escape(&metadata.categories.join(","))
        )
    };

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<PackageManifest Version="2.0.0" xmlns="{schema}" xmlns:d="{design}">
  <Metadata>
    <Identity Language="en-US" Id="{id}" Version="{version}" Publisher="{publisher}" />
    <DisplayName>{display_name}</DisplayName>
    <Description xml:space="preserve">{description}</Description>
    <Tags>{tags}</Tags>
{categories}    <GalleryFlags>Public</GalleryFlags>
    <Properties>
      <Property Id="Microsoft.VisualStudio.Code.Engine" Value="{engine}" />
    </Properties>
    <Icon>{icon}</Icon>
  </Metadata>
  <Installation>
    <InstallationTarget Id="Microsoft.VisualStudio.Code" />
  </Installation>
  <Dependencies />
  <Assets>
    <Asset Type="Microsoft.VisualStudio.Code.Manifest" Path="package.json" Addressable="true" />
    <Asset Type="Microsoft.VisualStudio.Services.Content.Details" Path="README.md" Addressable="true" />
    <Asset Type="Microsoft.VisualStudio.Services.Content.License" Path="LICENSE" Addressable="true" />
    <Asset Type="Microsoft.VisualStudio.Services.Icons.Default" Path="{icon}" Addressable="true" />
  </Assets>
</PackageManifest>
"#,
        schema = VSX_SCHEMA,
        design = VSX_DESIGN_SCHEMA,
        id = escape(&metadata.name),
        version = escape(&metadata.version),
        publisher = escape(&metadata.publisher),
        display_name = escape(metadata.display_name()),
        description = escape(metadata.description()),
        tags = escape(&metadata.keywords.join(",")),
        categories = categories,
        engine = escape(metadata.engine()),
        icon = escape(metadata.icon()),
    )
}
