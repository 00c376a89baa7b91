//! Known `lib.licenses` attribute names
//!
//! The manifest references licenses as `lib.licenses.<name>`, so anything not
//! in nixpkgs would fail evaluation downstream.

/// Accepted license attribute names
pub const VALID_LICENSES: &[&str] = &[
    "abstyles",
    "afl20",
    "afl21",
    "afl3",
    "agpl3Only",
    "agpl3Plus",
    "amazonsl",
    "amd",
    "aom",
    "apple-psl10",
    "apple-psl20",
    "apsl20",
    "arphicpl",
    "artistic1",
    "artistic2",
    "asl11",
    "asl20",
    "bitstreamVera",
    "blueOak100",
    "boost",
    "bsd0",
    "bsd1",
    "bsd2",
    "bsd2Patent",
    "bsd3",
    "bsd3Clear",
    "bsdOriginal",
    "bsl11",
    "bsl10",
    "cal10",
    "cc-by-30",
    "cc-by-40",
    "cc-by-nc-40",
    "cc-by-sa-30",
    "cc-by-sa-40",
    "cc0",
    "cddl",
    "cecill20",
    "cecill21",
    "cecill-b",
    "cecill-c",
    "cpal10",
    "cpl10",
    "curl",
    "db",
    "eapl",
    "ecl20",
    "efl20",
    "elastic20",
    "epl10",
    "epl20",
    "eupl11",
    "eupl12",
    "fdl13Only",
    "fdl13Plus",
    "free",
    "fsl11Mit",
    "fsl11Asl20",
    "ftl",
    "gpl1Only",
    "gpl1Plus",
    "gpl2Only",
    "gpl2Plus",
    "gpl3Only",
    "gpl3Plus",
    "hpnd",
    "imagemagick",
    "inria-compcert",
    "ipa",
    "ipl10",
    "isc",
    "lgpl2Only",
    "lgpl2Plus",
    "lgpl21Only",
    "lgpl21Plus",
    "lgpl3Only",
    "lgpl3Plus",
    "libpng",
    "libtiff",
    "llgpl21",
    "lppl13c",
    "miros",
    "mit",
    "mit0",
    "mpl10",
    "mpl11",
    "mpl20",
    "ms-pl",
    "mspl",
    "ncsa",
    "nlpl",
    "nposl3",
    "ofl",
    "oml",
    "openldap",
    "openssl",
    "osl21",
    "osl3",
    "php301",
    "postgresql",
    "psfl",
    "publicDomain",
    "purdueBsd",
    "python",
    "qhull",
    "qpl",
    "ruby",
    "sendmail",
    "sgi-b-20",
    "sleepycat",
    "smail",
    "sspl",
    "tcltk",
    "ucd",
    "unfree",
    "unfreeRedistributable",
    "unfreeRedistributableFirmware",
    "unicode-dfs-2015",
    "unicode-dfs-2016",
    "unlicense",
    "upl",
    "vim",
    "w3c",
    "wtfpl",
    "x11",
    "xfig",
    "zlib",
    "zpl20",
    "zpl21",
];

/// Whether `license` may appear in a manifest; empty means "no license"
pub fn is_valid_license(license: &str) -> bool {
    license.is_empty() || VALID_LICENSES.contains(&license)
}
