use alloy::sol;

sol!(
    #[derive(Debug, PartialEq, Eq)]
    struct SendParam {
        uint32 dstEid;
        bytes32 to;
        uint256 amountLD;
        uint256 minAmountLD;
        bytes extraOptions;
        bytes composeMsg;
        bytes oftCmd;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct MessagingFee {
        uint256 nativeFee;
        uint256 lzTokenFee;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct MessagingReceipt {
        bytes32 guid;
        uint64 nonce;
        MessagingFee fee;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct OFTReceipt {
        uint256 amountSentLD;
        uint256 amountReceivedLD;
    }

    /// Stargate V2 pool. Native and ERC-20 pools expose the same entry points.
    interface IStargate {
        function quoteSend(SendParam calldata sendParam, bool payInLzToken)
            external
            view
            returns (MessagingFee memory fee);

        function send(SendParam calldata sendParam, MessagingFee calldata fee, address refundAddress)
            external
            payable
            returns (MessagingReceipt memory msgReceipt, OFTReceipt memory oftReceipt);
    }

    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
    }
);
