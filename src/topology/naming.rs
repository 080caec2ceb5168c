//! Node and neighbor names.

pub fn spine(index: usize) -> String {
    format!("spine{}", index)
}

/// `leaf_num` is 1 or 2 within the pair
pub fn leaf(leaf_num: usize, asn: u32) -> String {
    format!("leaf{}-as{}", leaf_num, asn)
}

pub fn border_leaf(index: usize) -> String {
    format!("bl{}", index)
}

pub fn tor(index: usize, asn: u32) -> String {
    format!("tor{}-as{}", index, asn)
}

pub fn server(index: usize, asn: u32) -> String {
    format!("server{}-as{}", index, asn)
}

pub fn router(index: usize) -> String {
    format!("router{}", index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_embed_asn() {
        assert_eq!(spine(1), "spine1");
        assert_eq!(leaf(2, 4_200_001_000), "leaf2-as4200001000");
        assert_eq!(border_leaf(0), "bl0");
        assert_eq!(tor(3, 4_200_010_003), "tor3-as4200010003");
        assert_eq!(server(7, 4_200_100_007), "server7-as4200100007");
        assert_eq!(router(0), "router0");
    }
}
