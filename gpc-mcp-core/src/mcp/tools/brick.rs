//! Brick lookup tools

define_lookup_tool! {
    /// Full brick record for a brick code
    name: McpGetBrickObjectTool,
    tool: "get_brick_object",
    description: "get information regarding one gpc brick",
    arg: brick_code,
    arg_description: "Eight digit GPC brick code",
    lookup: |source, code| source.brick(&code)
}

define_lookup_tool! {
    name: McpGetClassCodeForBrickTool,
    tool: "get_class_code_for_brick",
    description: "get class code for a given brick",
    arg: brick_code,
    arg_description: "Eight digit GPC brick code",
    lookup: |source, code| source.class_code_for_brick(&code)
}

define_lookup_tool! {
    name: McpGetFamilyCodeForBrickTool,
    tool: "get_family_code_for_brick",
    description: "get family code for a given brick",
    arg: brick_code,
    arg_description: "Eight digit GPC brick code",
    lookup: |source, code| source.family_code_for_brick(&code)
}

define_lookup_tool! {
    name: McpGetSegmentCodeForBrickTool,
    tool: "get_segment_code_for_brick",
    description: "get segment code for a given brick",
    arg: brick_code,
    arg_description: "Eight digit GPC brick code",
    lookup: |source, code| source.segment_code_for_brick(&code)
}

define_lookup_tool! {
    name: McpGetClassObjectForBrickTool,
    tool: "get_class_object_for_brick",
    description: "get information regarding the gpc class a brick belongs to",
    arg: brick_code,
    arg_description: "Eight digit GPC brick code",
    lookup: |source, code| source.class_for_brick(&code)
}

define_lookup_tool! {
    /// All bricks of the queried brick's class, the brick itself included
    name: McpGetBrickSiblingTool,
    tool: "get_brick_sibling",
    description: "get all bricks that share a class with the given brick",
    arg: brick_code,
    arg_description: "Eight digit GPC brick code",
    lookup: |source, code| source.brick_siblings(&code)
}
